//! Debounced provider-name suggestions for the composer.
//!
//! Independent of the main turn path: keystrokes feed `input_changed`,
//! which cancels any pending lookup, waits out the debounce window, and
//! only commits results whose originating query still matches the current
//! input. Superseded responses are discarded, never applied.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::{ProviderSummary, SchedulingApi, VisitMode};
use crate::classify::Classifiers;

/// Suggestion results committed for a query.
#[derive(Debug)]
pub struct NameSuggestions {
    pub query: String,
    pub providers: Vec<ProviderSummary>,
    pub suggestions: Vec<ProviderSummary>,
}

/// Debounces fuzzy provider-name lookups behind the composer input.
pub struct SuggestionDebouncer {
    api: Arc<dyn SchedulingApi>,
    classifiers: Classifiers,
    delay: Duration,
    min_len: usize,
    limit: usize,
    /// The composer's current text, shared with in-flight lookups.
    current_input: Arc<Mutex<String>>,
    token: CancellationToken,
    tx: mpsc::UnboundedSender<NameSuggestions>,
}

impl SuggestionDebouncer {
    /// Returns the debouncer and the receiver the UI drains for results.
    pub fn new(
        api: Arc<dyn SchedulingApi>,
        delay: Duration,
        min_len: usize,
        limit: usize,
    ) -> (Self, mpsc::UnboundedReceiver<NameSuggestions>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                api,
                classifiers: Classifiers::new(),
                delay,
                min_len,
                limit,
                current_input: Arc::new(Mutex::new(String::new())),
                token: CancellationToken::new(),
                tx,
            },
            rx,
        )
    }

    /// Feed a keystroke. Cancels any pending lookup; schedules a new one
    /// only for name-shaped text of minimum length.
    pub fn input_changed(&mut self, text: &str, mode: Option<VisitMode>) {
        *self.current_input.lock().expect("input lock") = text.to_string();
        self.token.cancel();
        self.token = CancellationToken::new();

        let trimmed = text.trim();
        if trimmed.len() < self.min_len || !self.classifiers.looks_like_provider_name(trimmed) {
            return;
        }

        let api = Arc::clone(&self.api);
        let query = trimmed.to_string();
        let current_input = Arc::clone(&self.current_input);
        let token = self.token.clone();
        let tx = self.tx.clone();
        let delay = self.delay;
        let limit = self.limit;

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }

            let resp = tokio::select! {
                _ = token.cancelled() => return,
                resp = api.provider_search(&query, limit, mode) => resp,
            };
            let resp = match resp {
                Ok(resp) => resp,
                Err(e) => {
                    debug!(error = %e, query, "suggestion lookup failed");
                    return;
                }
            };

            // The input may have moved on while the request was in flight.
            {
                let input = current_input.lock().expect("input lock");
                if input.trim() != query {
                    debug!(query, current = %input, "discarding superseded suggestions");
                    return;
                }
            }
            if token.is_cancelled() {
                return;
            }

            let _ = tx.send(NameSuggestions {
                query,
                providers: resp.providers,
                suggestions: resp.suggestions,
            });
        });
    }

    /// Cancel any pending lookup (e.g. when the composer is submitted).
    pub fn cancel(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
    }
}
