//! Error types for the scheduling orchestrator.

/// Top-level error type for the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Collaborator error: {0}")]
    Api(#[from] ApiError),

    #[error("Geolocation error: {0}")]
    Geo(#[from] GeoError),

    #[error("Flow error: {0}")]
    Flow(#[from] FlowError),
}

/// Errors from the backend collaborator services.
///
/// These are surfaced to the user as assistant-role transcript entries,
/// never as panics — see the error taxonomy notes on `FlowController`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("{detail} (HTTP {status})")]
    Status { status: u16, detail: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Http(e.to_string())
    }
}

/// Geolocation / reverse-geocoding errors.
#[derive(Debug, thiserror::Error)]
pub enum GeoError {
    #[error("permission denied")]
    Denied,

    #[error("geolocation unavailable")]
    Unavailable,

    #[error("position lookup failed: {0}")]
    Position(String),

    #[error("reverse geocoding failed: {0}")]
    Geocode(String),
}

/// Flow state-machine precondition errors.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("a turn is already in progress")]
    TurnInProgress,

    #[error("unknown insurance plan: {0}")]
    UnknownPlan(String),

    #[error("no provider match with id {0}")]
    UnknownProvider(String),

    #[error("no candidate slot at index {index} for provider {provider_id}")]
    NoSuchSlot { provider_id: String, index: usize },

    #[error("'{option}' is not an option for question '{question}'")]
    InvalidOption { question: String, option: String },

    #[error("all triage questions are already answered")]
    TriageComplete,
}

/// Result type alias for the orchestrator.
pub type Result<T> = std::result::Result<T, Error>;
