//! Wire types for the backend collaborator services.
//!
//! These mirror the JSON contracts of the scheduling backend. All of them
//! are read-only to the core: the orchestrator never re-ranks or rewrites
//! what the collaborators return.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ── Shared vocabulary ───────────────────────────────────────────────

/// Delivery mode for a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisitMode {
    InPerson,
    Virtual,
}

impl VisitMode {
    /// Human-readable label for transcript text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InPerson => "In person",
            Self::Virtual => "Virtual",
        }
    }
}

impl std::fmt::Display for VisitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::InPerson => "in_person",
            Self::Virtual => "virtual",
        };
        write!(f, "{s}")
    }
}

/// Care category used to filter providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    PrimaryCare,
    UrgentCare,
    Dermatology,
    Orthopedics,
    Cardiology,
    Neurology,
}

impl ProviderType {
    /// All care categories, in picker display order.
    pub const ALL: [ProviderType; 6] = [
        Self::UrgentCare,
        Self::PrimaryCare,
        Self::Dermatology,
        Self::Orthopedics,
        Self::Cardiology,
        Self::Neurology,
    ];

    /// Lowercase display name for transcript text.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::PrimaryCare => "primary care",
            Self::UrgentCare => "urgent care",
            Self::Dermatology => "dermatology",
            Self::Orthopedics => "orthopedics",
            Self::Cardiology => "cardiology",
            Self::Neurology => "neurology",
        }
    }

    /// Quick-reply label for the care-type picker.
    pub fn picker_label(&self) -> &'static str {
        match self {
            Self::PrimaryCare => "Primary care",
            Self::UrgentCare => "Urgent care",
            Self::Dermatology => "Dermatology",
            Self::Orthopedics => "Orthopedics",
            Self::Cardiology => "Cardiology",
            Self::Neurology => "Neurology",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::PrimaryCare => "primary_care",
            Self::UrgentCare => "urgent_care",
            Self::Dermatology => "dermatology",
            Self::Orthopedics => "orthopedics",
            Self::Cardiology => "cardiology",
            Self::Neurology => "neurology",
        };
        write!(f, "{s}")
    }
}

/// The visit reason inferred by the intent collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitReason {
    pub code: String,
    pub label: String,
}

impl Default for VisitReason {
    fn default() -> Self {
        Self {
            code: "GENERIC_TRIAGE".to_string(),
            label: "a health concern".to_string(),
        }
    }
}

// ── search-intent ───────────────────────────────────────────────────

/// Request body for the free-text intent classification collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct SearchIntentRequest {
    pub session_id: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_preference: Option<VisitMode>,
}

/// Structured visit-reason / escalation data from the intent collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchIntentResponse {
    pub escalate: bool,
    #[serde(default)]
    pub safety_message: Option<String>,
    #[serde(default)]
    pub visit_reason_code: Option<String>,
    #[serde(default)]
    pub visit_reason_label: Option<String>,
    #[serde(default)]
    pub recommended_provider_type: Option<ProviderType>,
    #[serde(default)]
    pub confidence: Option<String>,
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

// ── care-options ────────────────────────────────────────────────────

/// A selectable care type for a visit reason.
#[derive(Debug, Clone, Deserialize)]
pub struct CareOption {
    pub provider_type: ProviderType,
    pub label: String,
    #[serde(default)]
    pub suggested: bool,
}

// ── providers / provider-search ─────────────────────────────────────

/// A provider as returned by the directory collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub provider_id: String,
    pub name: String,
    pub provider_type: ProviderType,
    pub accepts_virtual: bool,
    pub location_name: String,
    pub location_city: String,
    pub location_state: String,
    #[serde(default)]
    pub next_available_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_available_mode: Option<VisitMode>,
    #[serde(default)]
    pub availability_label: Option<String>,
}

impl ProviderSummary {
    /// The provider's default delivery mode when no live slot says otherwise.
    pub fn default_mode(&self) -> VisitMode {
        if self.accepts_virtual {
            VisitMode::Virtual
        } else {
            VisitMode::InPerson
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersResponse {
    pub providers: Vec<ProviderSummary>,
}

/// Fuzzy provider-name search result: direct matches plus near-miss
/// suggestions (last-name prefix or close spelling).
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSearchResponse {
    pub providers: Vec<ProviderSummary>,
    #[serde(default)]
    pub suggestions: Vec<ProviderSummary>,
}

// ── availability ────────────────────────────────────────────────────

/// A live bookable slot from the availability collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilitySlot {
    pub provider_id: String,
    pub provider_name: String,
    pub location_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: VisitMode,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityResponse {
    pub slots: Vec<AvailabilitySlot>,
}

// ── holds ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CreateHoldRequest {
    pub session_id: String,
    pub provider_id: String,
    pub start: DateTime<Utc>,
    pub mode: VisitMode,
    pub visit_reason_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHoldResponse {
    pub hold_id: String,
    pub expires_at: DateTime<Utc>,
}

// ── appointments ────────────────────────────────────────────────────

/// Patient fields required to confirm a booking.
#[derive(Debug, Clone, Serialize)]
pub struct PatientDemographics {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookAppointmentRequest {
    pub session_id: String,
    pub hold_id: String,
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_dob: NaiveDate,
    pub patient_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookAppointmentResponse {
    pub appointment_id: String,
    pub provider_name: String,
    pub location_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: VisitMode,
    pub status: String,
}
