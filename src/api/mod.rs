//! Backend collaborator interface.
//!
//! The orchestrator talks to one scheduling backend exposing intent
//! classification, the provider directory, availability, holds, and booking
//! confirmation. `SchedulingApi` is the seam: the production implementation
//! is [`http::HttpSchedulingApi`]; tests drive the controller with in-memory
//! mocks.

pub mod http;
pub mod types;

use async_trait::async_trait;

use crate::error::ApiError;
pub use types::*;

/// The scheduling backend, as seen by the core.
///
/// Pure I/O — no flow logic. Every method maps 1:1 onto a backend endpoint
/// and performs exactly one attempt (no retry policy, per the error
/// taxonomy).
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    /// POST search-intent — classify free text into a visit reason, or an
    /// escalation when the text carries red-flag symptoms.
    async fn search_intent(
        &self,
        req: &SearchIntentRequest,
    ) -> Result<SearchIntentResponse, ApiError>;

    /// GET care-options — selectable care types for a visit reason.
    async fn care_options(
        &self,
        visit_reason_code: &str,
        recommended: ProviderType,
    ) -> Result<Vec<CareOption>, ApiError>;

    /// GET providers — directory listing for one care category.
    async fn providers(
        &self,
        provider_type: ProviderType,
        limit: usize,
        mode: Option<VisitMode>,
    ) -> Result<Vec<ProviderSummary>, ApiError>;

    /// GET provider-search — fuzzy search by provider name.
    async fn provider_search(
        &self,
        query: &str,
        limit: usize,
        mode: Option<VisitMode>,
    ) -> Result<ProviderSearchResponse, ApiError>;

    /// GET availability — live slots for a care category.
    async fn availability(
        &self,
        provider_type: ProviderType,
        days: u32,
        mode: VisitMode,
        visit_reason_code: &str,
    ) -> Result<Vec<AvailabilitySlot>, ApiError>;

    /// POST holds — reserve a slot for a short window.
    async fn create_hold(
        &self,
        req: &CreateHoldRequest,
    ) -> Result<CreateHoldResponse, ApiError>;

    /// POST appointments — confirm a booking from a hold.
    async fn book_appointment(
        &self,
        req: &BookAppointmentRequest,
    ) -> Result<BookAppointmentResponse, ApiError>;
}
