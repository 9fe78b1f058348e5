//! Provider discovery coordinator.
//!
//! Requests a bounded provider list from the directory (by specialty, or by
//! fuzzy name search), keeps the collaborator's ordering untouched, and
//! synthesizes candidate slots for providers without live availability.
//! Output is a set of transcript entries plus the match list the UI renders.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::api::{ProviderSummary, ProviderType, SchedulingApi, VisitMode};
use crate::error::ApiError;
use crate::session::{AppointmentSlot, Message, MessageKind, ProviderMatch};

/// Why discovery was triggered — drives the intro wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryIntent {
    General,
    NextAvailable,
    InsuranceFilter { plan: String },
}

/// What a discovery pass produced.
#[derive(Debug)]
pub struct DiscoveryOutcome {
    pub messages: Vec<Message>,
    pub matches: Vec<ProviderMatch>,
}

/// Coordinates directory/search calls and slot synthesis.
pub struct DiscoveryCoordinator {
    api: Arc<dyn SchedulingApi>,
    limit: usize,
    search_days: u32,
}

impl DiscoveryCoordinator {
    pub fn new(api: Arc<dyn SchedulingApi>, limit: usize, search_days: u32) -> Self {
        Self {
            api,
            limit,
            search_days,
        }
    }

    /// Specialty-driven discovery. `query` is the originating utterance (or
    /// care-type label) echoed in the intro; `location` is already
    /// normalized ("near you" default).
    pub async fn by_specialty(
        &self,
        specialty: ProviderType,
        query: &str,
        location: &str,
        mode: Option<VisitMode>,
        visit_reason_code: &str,
        intent: &DiscoveryIntent,
    ) -> Result<DiscoveryOutcome, ApiError> {
        info!(%specialty, location, intent = ?intent, "provider discovery");
        let providers = self.api.providers(specialty, self.limit, mode).await?;

        // Next-available requests pull the live calendar; providers it
        // doesn't cover get synthesized slots below. A calendar failure
        // degrades to synthesis rather than failing the turn.
        let live = if *intent == DiscoveryIntent::NextAvailable {
            let fetch_mode = mode.unwrap_or(VisitMode::InPerson);
            match self
                .api
                .availability(specialty, self.search_days, fetch_mode, visit_reason_code)
                .await
            {
                Ok(slots) => slots,
                Err(e) => {
                    debug!(error = %e, "availability fetch failed, synthesizing slots");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let intro = intro_message(intent, specialty, query, location);
        let matches = build_matches_with_live(providers, live, Utc::now());

        let mut messages = vec![Message::assistant(intro)];
        if matches.is_empty() {
            messages.push(Message::assistant(format!(
                "I couldn't find any {} providers right now. Want to try a different care type?",
                specialty.display_name()
            )));
        } else {
            messages.push(provider_list_message(&matches));
        }
        Ok(DiscoveryOutcome { messages, matches })
    }

    /// Name-driven discovery. Returns `Ok(None)` when neither direct
    /// matches nor suggestions exist, so the caller can fall through to the
    /// next classification rule.
    pub async fn by_name(
        &self,
        query: &str,
        mode: Option<VisitMode>,
    ) -> Result<Option<DiscoveryOutcome>, ApiError> {
        debug!(query, "provider name lookup");
        let resp = self.api.provider_search(query, self.limit, mode).await?;

        let (intro, providers) = if !resp.providers.is_empty() {
            (
                format!("Here are providers matching '{query}'."),
                resp.providers,
            )
        } else if !resp.suggestions.is_empty() {
            (
                format!("No exact match for '{query}' — showing providers with similar names."),
                resp.suggestions,
            )
        } else {
            return Ok(None);
        };

        let matches = build_matches(providers, Utc::now());
        let messages = vec![Message::assistant(intro), provider_list_message(&matches)];
        Ok(Some(DiscoveryOutcome { messages, matches }))
    }
}

/// Intro wording per discovery intent.
fn intro_message(
    intent: &DiscoveryIntent,
    specialty: ProviderType,
    query: &str,
    location: &str,
) -> String {
    let care = specialty.display_name();
    match intent {
        DiscoveryIntent::InsuranceFilter { plan } => {
            format!("Here are {care} options {location} that accept {plan}.")
        }
        DiscoveryIntent::NextAvailable => {
            format!("Here are the next available {care} appointments {location} for '{query}'.")
        }
        DiscoveryIntent::General => {
            format!("Here are {care} options {location} based on '{query}'.")
        }
    }
}

/// Attach candidate slots to each provider, keeping directory order.
fn build_matches(providers: Vec<ProviderSummary>, now: DateTime<Utc>) -> Vec<ProviderMatch> {
    build_matches_with_live(providers, Vec::new(), now)
}

/// Like `build_matches`, but providers covered by live calendar slots use
/// those (first four, calendar order) instead of synthesized candidates.
fn build_matches_with_live(
    providers: Vec<ProviderSummary>,
    live: Vec<crate::api::AvailabilitySlot>,
    now: DateTime<Utc>,
) -> Vec<ProviderMatch> {
    providers
        .into_iter()
        .map(|provider| {
            let live_slots: Vec<AppointmentSlot> = live
                .iter()
                .filter(|s| s.provider_id == provider.provider_id)
                .take(4)
                .map(|s| AppointmentSlot {
                    start: s.start,
                    mode: s.mode,
                })
                .collect();
            let slots = if live_slots.is_empty() {
                candidate_slots(&provider, now)
            } else {
                live_slots
            };
            ProviderMatch { provider, slots }
        })
        .collect()
}

/// Synthesize four candidate slots at 0/30/60/90-minute offsets from the
/// provider's next-available time, or from one hour out when the directory
/// reported none. The slot mode inherits the provider's next-available
/// mode, falling back to its virtual/in-person default.
pub fn candidate_slots(provider: &ProviderSummary, now: DateTime<Utc>) -> Vec<AppointmentSlot> {
    let base = provider
        .next_available_start
        .unwrap_or_else(|| now + Duration::hours(1));
    let mode = provider
        .next_available_mode
        .unwrap_or_else(|| provider.default_mode());
    (0..4)
        .map(|i| AppointmentSlot {
            start: base + Duration::minutes(30 * i),
            mode,
        })
        .collect()
}

/// One line per provider for the provider-list transcript entry.
fn provider_list_message(matches: &[ProviderMatch]) -> Message {
    let lines: Vec<String> = matches
        .iter()
        .map(|m| {
            let p = &m.provider;
            let availability = p
                .availability_label
                .clone()
                .unwrap_or_else(|| "Availability on request".to_string());
            format!(
                "{} — {}, {} ({}, {}) · {}",
                p.name,
                p.provider_type.display_name(),
                p.location_name,
                p.location_city,
                p.location_state,
                availability
            )
        })
        .collect();
    Message::assistant_kind(lines.join("\n"), MessageKind::ProviderList)
}
