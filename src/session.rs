//! Session state — the transcript and everything a turn can touch.
//!
//! A session owns one append-only transcript plus the flow-local state for
//! the current turn. Flow-local state is a single value replaced wholesale
//! at the start of every user turn, which makes the reset-on-new-turn
//! invariant structural rather than a convention.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{ProviderSummary, ProviderType, VisitMode, VisitReason};
use crate::classify::{PatientGroup, Urgency};
use crate::insurance::InsurancePlan;

// ── Messages ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Rendering hint for a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Plain,
    ProviderList,
    AppointmentOverview,
    InsurancePicker,
    Success,
}

/// One transcript entry. The transcript is append-only and never reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub text: String,
    pub kind: MessageKind,
    /// Quick-reply option labels, when the entry offers choices.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            text: text.into(),
            kind: MessageKind::Plain,
            options: Vec::new(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
            kind: MessageKind::Plain,
            options: Vec::new(),
        }
    }

    pub fn assistant_kind(text: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            role: MessageRole::Assistant,
            text: text.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }
}

// ── Flow ────────────────────────────────────────────────────────────

/// The mutually-exclusive conversational flows. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Idle,
    InsuranceSelection,
    ProviderDiscovery,
    SymptomTriage,
    GenericIntent,
    AppointmentHold,
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::InsuranceSelection => "insurance_selection",
            Self::ProviderDiscovery => "provider_discovery",
            Self::SymptomTriage => "symptom_triage",
            Self::GenericIntent => "generic_intent",
            Self::AppointmentHold => "appointment_hold",
        };
        write!(f, "{s}")
    }
}

// ── Flow-local state ────────────────────────────────────────────────

/// A candidate (time, mode) pair for a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub start: DateTime<Utc>,
    pub mode: VisitMode,
}

/// A provider surfaced by discovery, with its candidate slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderMatch {
    pub provider: ProviderSummary,
    pub slots: Vec<AppointmentSlot>,
}

/// The slot the user picked, denormalized for hold/booking calls.
#[derive(Debug, Clone)]
pub struct SelectedSlot {
    pub provider_id: String,
    pub provider_name: String,
    pub slot: AppointmentSlot,
}

/// Signals inferred from the current utterance during generic intent.
#[derive(Debug, Clone, Copy, Default)]
pub struct InferredSignals {
    pub mode: Option<VisitMode>,
    pub urgency: Option<Urgency>,
    pub patient_group: Option<PatientGroup>,
}

/// Everything scoped to the current turn's flow.
///
/// Replaced with `Default` at the start of every user turn — never merged.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    pub provider_matches: Vec<ProviderMatch>,
    pub triage: crate::triage::TriageState,
    pub selected_slot: Option<SelectedSlot>,
    pub inferred: InferredSignals,
}

// ── Session ─────────────────────────────────────────────────────────

/// One conversation. Created once, lives for the page's lifetime.
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub transcript: Vec<Message>,
    pub flow: Flow,
    /// Sticky across turns: a stated delivery-mode preference.
    pub mode_preference: Option<VisitMode>,
    /// Sticky across turns: the selected or recommended care type.
    pub care_type: Option<ProviderType>,
    /// Sticky across turns: the selected insurance plan, if any.
    pub insurance_plan: Option<InsurancePlan>,
    pub visit_reason: VisitReason,
    /// Flow-local state for the current turn.
    pub turn: TurnState,
    /// Monotonic turn counter; stale async results compare against it.
    pub turn_seq: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: format!("sess_{}", Uuid::new_v4().simple()),
            transcript: Vec::new(),
            flow: Flow::Idle,
            mode_preference: None,
            care_type: None,
            insurance_plan: None,
            visit_reason: VisitReason::default(),
            turn: TurnState::default(),
            turn_seq: 0,
        }
    }

    /// Start a user turn: append the utterance and replace all flow-local
    /// state. Sticky preferences (mode, care type, insurance plan) survive.
    pub fn begin_turn(&mut self, text: &str) {
        self.transcript.push(Message::user(text));
        self.turn = TurnState::default();
        self.flow = Flow::Idle;
        self.turn_seq += 1;
    }

    pub fn push(&mut self, message: Message) {
        self.transcript.push(message);
    }

    /// The last assistant entry, if any.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Find a surfaced provider match by id.
    pub fn provider_match(&self, provider_id: &str) -> Option<&ProviderMatch> {
        self.turn
            .provider_matches
            .iter()
            .find(|m| m.provider.provider_id == provider_id)
    }
}
