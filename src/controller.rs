//! Flow controller — the top-level conversational state machine.
//!
//! Every user turn resets flow-local state, walks the precedence chain,
//! and dispatches to exactly one flow. Collaborator failures surface as
//! assistant-role transcript entries and leave the session recoverable;
//! escalation short-circuits the turn before any further collaborator
//! call. One turn is in flight at a time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::{
    PatientDemographics, ProviderType, SchedulingApi, SearchIntentRequest, VisitMode, VisitReason,
};
use crate::booking::BookingLifecycle;
use crate::classify::{PatientGroup, RouteMatch, Router, Urgency};
use crate::config::OrchestratorConfig;
use crate::discovery::{DiscoveryCoordinator, DiscoveryIntent, DiscoveryOutcome};
use crate::error::{ApiError, FlowError, Result};
use crate::geo::{GeoResolver, GeoStatus, LocationService};
use crate::insurance;
use crate::session::{
    Flow, InferredSignals, Message, MessageKind, SelectedSlot, Session,
};
use crate::suggest::{NameSuggestions, SuggestionDebouncer};

/// Fallback safety message when the collaborator escalates without one.
const DEFAULT_ESCALATION_MESSAGE: &str =
    "If you think this may be an emergency, call 911 or go to the nearest emergency room.";

/// Orchestrates classification, flows, and the hold/booking lifecycle for
/// one session.
pub struct FlowController {
    session: Session,
    api: Arc<dyn SchedulingApi>,
    discovery: DiscoveryCoordinator,
    geo: GeoResolver,
    router: Router,
    lifecycle: BookingLifecycle,
    config: OrchestratorConfig,
    busy: bool,
    searching: bool,
}

impl FlowController {
    pub fn new(
        api: Arc<dyn SchedulingApi>,
        location: Arc<dyn LocationService>,
        config: OrchestratorConfig,
    ) -> Self {
        let discovery = DiscoveryCoordinator::new(
            Arc::clone(&api),
            config.provider_limit,
            config.search_days,
        );
        Self {
            session: Session::new(),
            api,
            discovery,
            geo: GeoResolver::new(location),
            router: Router::new(),
            lifecycle: BookingLifecycle::default(),
            config,
            busy: false,
            searching: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Composer gate: true while a turn's collaborator chain is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// True only while a discovery request is outstanding — guaranteed to
    /// revert on both success and failure.
    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn geo_status(&self) -> GeoStatus {
        self.geo.status()
    }

    pub fn current_hold(&self) -> Option<&crate::booking::Hold> {
        self.lifecycle.hold()
    }

    // ── Turn handling ───────────────────────────────────────────────

    /// Process one user utterance end to end.
    pub async fn handle_turn(&mut self, text: &str) -> Result<()> {
        if self.busy {
            return Err(FlowError::TurnInProgress.into());
        }
        self.busy = true;
        let result = self.dispatch(text).await;
        self.busy = false;
        result
    }

    async fn dispatch(&mut self, text: &str) -> Result<()> {
        // Fresh classification pass: all flow-local state goes, including
        // any tracked hold and the geolocation machine.
        self.session.begin_turn(text);
        self.lifecycle.clear();
        self.geo.reset();
        info!(turn = self.session.turn_seq, "user turn");

        for route in self.router.candidates(text) {
            debug!(route = route.label(), "trying route");
            match route {
                RouteMatch::Insurance => {
                    self.enter_insurance();
                    return Ok(());
                }
                RouteMatch::ProviderName { query } => {
                    let lookup = self
                        .discovery
                        .by_name(&query, self.session.mode_preference)
                        .await;
                    match lookup {
                        Ok(Some(outcome)) => {
                            self.apply_discovery(outcome);
                            return Ok(());
                        }
                        // Nothing by that name — fall through to the next
                        // rule instead of ending the turn.
                        Ok(None) => {
                            debug!(query, "name lookup empty, falling through");
                            continue;
                        }
                        Err(e) => {
                            self.push_collaborator_error(&e);
                            return Ok(());
                        }
                    }
                }
                RouteMatch::ProviderSearch {
                    specialty,
                    location,
                    next_available,
                } => {
                    let intent = if next_available {
                        DiscoveryIntent::NextAvailable
                    } else {
                        DiscoveryIntent::General
                    };
                    self.run_discovery(specialty, text, &location, intent).await;
                    return Ok(());
                }
                RouteMatch::SymptomTriage => {
                    self.enter_triage();
                    return Ok(());
                }
                RouteMatch::Generic => {
                    return self.run_generic(text).await;
                }
            }
        }
        Ok(())
    }

    // ── Provider discovery ──────────────────────────────────────────

    async fn run_discovery(
        &mut self,
        specialty: ProviderType,
        query: &str,
        location: &str,
        intent: DiscoveryIntent,
    ) {
        let visit_reason_code = self.session.visit_reason.code.clone();
        self.searching = true;
        let result = self
            .discovery
            .by_specialty(
                specialty,
                query,
                location,
                self.session.mode_preference,
                &visit_reason_code,
                &intent,
            )
            .await;
        self.searching = false;

        match result {
            Ok(outcome) => {
                self.session.care_type = Some(specialty);
                self.apply_discovery(outcome);
            }
            Err(e) => self.push_collaborator_error(&e),
        }
    }

    fn apply_discovery(&mut self, outcome: DiscoveryOutcome) {
        for message in outcome.messages {
            self.session.push(message);
        }
        self.session.turn.provider_matches = outcome.matches;
        self.session.flow = Flow::ProviderDiscovery;
    }

    // ── Insurance selection ─────────────────────────────────────────

    fn enter_insurance(&mut self) {
        self.session.flow = Flow::InsuranceSelection;
        self.session.push(Message::assistant(
            "I can help with that. Which insurance plan do you have?",
        ));
        self.session.push(
            Message::assistant_kind("Select your insurance plan:", MessageKind::InsurancePicker)
                .with_options(insurance::picker_options()),
        );
    }

    /// Record the picked plan and prompt for a care type. Choosing a care
    /// type afterwards runs discovery filtered by the plan.
    pub fn select_insurance_plan(&mut self, key: &str) -> Result<()> {
        if self.session.flow != Flow::InsuranceSelection {
            debug!(flow = %self.session.flow, "plan selection outside insurance flow, ignoring");
            return Ok(());
        }
        let plan =
            insurance::find_plan(key).ok_or_else(|| FlowError::UnknownPlan(key.to_string()))?;
        self.session.push(Message::user(plan.name));
        info!(plan = plan.id, "insurance plan selected");
        self.session.push(
            Message::assistant(format!(
                "Got it — {} ({}). What type of care are you looking for?",
                plan.name, plan.shorthand
            ))
            .with_options(
                ProviderType::ALL
                    .iter()
                    .map(|p| p.picker_label().to_string())
                    .collect(),
            ),
        );
        self.session.insurance_plan = Some(plan);
        Ok(())
    }

    /// Care-type quick reply, from the insurance flow or a generic prompt.
    pub async fn choose_care_type(&mut self, provider_type: ProviderType) -> Result<()> {
        self.session.push(Message::user(provider_type.picker_label()));
        let intent = match &self.session.insurance_plan {
            Some(plan) => DiscoveryIntent::InsuranceFilter {
                plan: plan.name.to_string(),
            },
            None => DiscoveryIntent::General,
        };
        self.run_discovery(
            provider_type,
            provider_type.display_name(),
            "near you",
            intent,
        )
        .await;
        Ok(())
    }

    // ── Symptom triage ──────────────────────────────────────────────

    fn enter_triage(&mut self) {
        self.session.flow = Flow::SymptomTriage;
        // Fire-and-forget; stale results are cancelled on the next reset.
        if self.geo.status() == GeoStatus::Idle {
            self.geo.request();
        }
        self.session.push(Message::assistant(
            "I'm sorry you're not feeling well. Let's run through a few quick questions.",
        ));
        self.push_current_question();
    }

    fn push_current_question(&mut self) {
        if let Some(q) = self.session.turn.triage.current_question() {
            self.session.push(
                Message::assistant(q.prompt)
                    .with_options(q.options.iter().map(|o| o.to_string()).collect()),
            );
        }
    }

    /// Quick-reply answer for the current triage question.
    pub fn answer_symptom(&mut self, option: &str) -> Result<()> {
        if self.session.flow != Flow::SymptomTriage {
            debug!(flow = %self.session.flow, "triage answer outside triage flow, ignoring");
            return Ok(());
        }
        self.session.turn.triage.record_answer(option)?;
        self.session.push(Message::user(option));

        if self.session.turn.triage.is_complete() {
            let summary = self.session.turn.triage.summary();
            self.session.push(Message::assistant(summary));
            let location_phrase = match self.geo.location_label() {
                Some(label) => format!("in {label}"),
                None => "near you".to_string(),
            };
            let closing = self.session.turn.triage.closing_message(&location_phrase);
            self.session.push(Message::assistant(closing));
        } else {
            self.push_current_question();
        }
        Ok(())
    }

    // ── Generic intent ──────────────────────────────────────────────

    async fn run_generic(&mut self, text: &str) -> Result<()> {
        let req = SearchIntentRequest {
            session_id: self.session.id.clone(),
            message: text.to_string(),
            mode_preference: self.session.mode_preference,
        };
        let resp = match self.api.search_intent(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                self.push_collaborator_error(&e);
                return Ok(());
            }
        };

        // Escalation is an absolute override: the safety message and
        // nothing else — no flow transition, no further collaborator call.
        if resp.escalate {
            warn!("intent collaborator escalated");
            let text = resp
                .safety_message
                .unwrap_or_else(|| DEFAULT_ESCALATION_MESSAGE.to_string());
            self.session.push(Message::assistant(text));
            self.session.flow = Flow::Idle;
            return Ok(());
        }

        let classifiers = self.router.classifiers();
        let inferred = InferredSignals {
            mode: classifiers.detect_mode_preference(text),
            urgency: classifiers.detect_urgency(text),
            patient_group: classifiers.detect_patient_group(text),
        };
        if let Some(mode) = inferred.mode {
            self.session.mode_preference = Some(mode);
        }
        self.session.turn.inferred = inferred;

        if let (Some(code), Some(label)) =
            (resp.visit_reason_code.clone(), resp.visit_reason_label.clone())
        {
            self.session.visit_reason = VisitReason { code, label };
        }
        if let Some(pt) = resp.recommended_provider_type {
            self.session.care_type = Some(pt);
        }

        let mut reply = String::from("Got it.");
        if inferred.patient_group == Some(PatientGroup::Pediatric) {
            reply.push_str(" I'll look for pediatric-friendly options.");
        }
        match inferred.mode {
            Some(VisitMode::Virtual) => reply.push_str(" A virtual visit works for that."),
            Some(VisitMode::InPerson) => reply.push_str(" An in-person visit works for that."),
            None => {}
        }
        match inferred.urgency {
            Some(Urgency::Urgent) => reply.push_str(" I'll prioritize same-day availability."),
            Some(Urgency::Routine) => reply.push_str(" A routine visit sounds right."),
            None => {}
        }
        reply.push_str(&format!(
            " I can help you schedule for {}. Choose a care type and then pick a time.",
            self.session.visit_reason.label
        ));

        // Care-type quick replies come from the care-options collaborator,
        // degrading to the static picker labels on failure.
        let recommended = resp
            .recommended_provider_type
            .unwrap_or(ProviderType::PrimaryCare);
        let care_labels = match self
            .api
            .care_options(&self.session.visit_reason.code, recommended)
            .await
        {
            Ok(options) => options.into_iter().map(|o| o.label).collect(),
            Err(e) => {
                debug!(error = %e, "care-options failed, using static labels");
                ProviderType::ALL
                    .iter()
                    .map(|p| p.picker_label().to_string())
                    .collect()
            }
        };
        self.session
            .push(Message::assistant(reply).with_options(care_labels));

        // At most one outstanding follow-up prompt, for the first unknown
        // dimension among mode, urgency, patient group.
        if self.session.mode_preference.is_none() {
            self.session.push(
                Message::assistant("Would you prefer an in-person or virtual visit?")
                    .with_options(vec!["In person".into(), "Virtual".into()]),
            );
        } else if inferred.urgency.is_none() {
            self.session.push(
                Message::assistant("Is this urgent, or more of a routine visit?")
                    .with_options(vec!["Urgent".into(), "Routine".into()]),
            );
        } else if inferred.patient_group.is_none() {
            self.session.push(
                Message::assistant("Is the appointment for an adult or a child?")
                    .with_options(vec!["Adult".into(), "Child".into()]),
            );
        }

        // Collaborator follow-ups land after the quick-reply prompt.
        for question in resp.follow_up_questions {
            self.session.push(Message::assistant(question));
        }

        self.session.flow = Flow::GenericIntent;
        Ok(())
    }

    // ── Hold & booking ──────────────────────────────────────────────

    /// Reserve one of a surfaced provider's candidate slots.
    pub async fn hold_slot(&mut self, provider_id: &str, slot_index: usize) -> Result<()> {
        let (provider, slot) = {
            let m = self
                .session
                .provider_match(provider_id)
                .ok_or_else(|| FlowError::UnknownProvider(provider_id.to_string()))?;
            let slot = *m.slots.get(slot_index).ok_or_else(|| FlowError::NoSuchSlot {
                provider_id: provider_id.to_string(),
                index: slot_index,
            })?;
            (m.provider.clone(), slot)
        };

        let created = self
            .lifecycle
            .create_hold(
                self.api.as_ref(),
                &self.session.id,
                &provider,
                slot,
                &self.session.visit_reason.code,
            )
            .await;

        match created {
            Ok(hold) => {
                let overview = format!(
                    "You're holding {} ({}) with {} at {}. This hold expires at {}.",
                    hold.slot.start.format("%a %b %-d, %-I:%M %p"),
                    hold.slot.mode.label(),
                    hold.provider_name,
                    hold.location_name,
                    hold.expires_at.format("%-I:%M %p"),
                );
                self.session.turn.selected_slot = Some(SelectedSlot {
                    provider_id: provider.provider_id.clone(),
                    provider_name: provider.name.clone(),
                    slot,
                });
                self.session.flow = Flow::AppointmentHold;
                self.session
                    .push(Message::assistant_kind(overview, MessageKind::AppointmentOverview));
            }
            Err(e) => {
                warn!(error = %e, "hold creation failed");
                self.session
                    .push(Message::assistant(format!("Hold failed: {e}")));
            }
        }
        Ok(())
    }

    /// Confirm the booking from the active hold. Without one this is a
    /// silent no-op — the transcript and session state stay unchanged.
    pub async fn confirm_booking(
        &mut self,
        patient: &PatientDemographics,
        notes: Option<String>,
    ) -> Result<()> {
        let confirmed = self
            .lifecycle
            .confirm(self.api.as_ref(), &self.session.id, patient, notes)
            .await;

        match confirmed {
            Ok(None) => Ok(()),
            Ok(Some(booking)) => {
                let text = format!(
                    "You're booked with {} on {} ({}) at {}. Confirmation #{}.",
                    booking.provider_name,
                    booking.slot.start.format("%a %b %-d, %-I:%M %p"),
                    booking.slot.mode.label(),
                    booking.location_name,
                    booking.id,
                );
                self.session
                    .push(Message::assistant_kind(text, MessageKind::Success));
                self.session.flow = Flow::Idle;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "booking failed, hold retained");
                self.session
                    .push(Message::assistant(format!("Booking failed: {e}")));
                Ok(())
            }
        }
    }

    // ── Shared ──────────────────────────────────────────────────────

    /// Taxonomy (a): network/HTTP failure — verbatim assistant entry, no
    /// retry, flow back to idle.
    fn push_collaborator_error(&mut self, e: &ApiError) {
        warn!(error = %e, "collaborator call failed");
        self.session.push(Message::assistant(format!(
            "Sorry — something went wrong: {e}. Please try again."
        )));
        self.session.flow = Flow::Idle;
    }

    /// Number of days the availability window covers, for UIs that fetch
    /// live calendars directly.
    pub fn search_days(&self) -> u32 {
        self.config.search_days
    }

    /// Build the composer's name-suggestion debouncer against this
    /// session's backend and configuration.
    pub fn suggestion_debouncer(
        &self,
    ) -> (
        SuggestionDebouncer,
        tokio::sync::mpsc::UnboundedReceiver<NameSuggestions>,
    ) {
        SuggestionDebouncer::new(
            Arc::clone(&self.api),
            self.config.suggestion_debounce,
            self.config.suggestion_min_len,
            self.config.provider_limit,
        )
    }
}
