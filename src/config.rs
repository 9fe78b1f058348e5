//! Configuration types.

use std::time::Duration;

/// Orchestrator configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum providers surfaced per discovery pass.
    pub provider_limit: usize,
    /// Debounce delay before a provider-name suggestion lookup fires.
    pub suggestion_debounce: Duration,
    /// Minimum input length before suggestion lookups trigger.
    pub suggestion_min_len: usize,
    /// Days ahead the availability window covers.
    pub search_days: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            provider_limit: 4,
            suggestion_debounce: Duration::from_millis(200),
            suggestion_min_len: 3,
            search_days: 14,
        }
    }
}
