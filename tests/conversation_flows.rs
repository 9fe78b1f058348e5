//! End-to-end conversation flows against mock collaborators.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use care_assist::api::{
    AvailabilitySlot, BookAppointmentRequest, BookAppointmentResponse, CareOption,
    CreateHoldRequest, CreateHoldResponse, PatientDemographics, ProviderSearchResponse,
    ProviderSummary, ProviderType, SchedulingApi, SearchIntentRequest, SearchIntentResponse,
    VisitMode,
};
use care_assist::config::OrchestratorConfig;
use care_assist::controller::FlowController;
use care_assist::error::{ApiError, GeoError};
use care_assist::geo::{Coordinates, GeoStatus, LocationService};
use care_assist::session::{Flow, MessageKind, MessageRole};

// ── Mock backend ────────────────────────────────────────────────────

struct MockBackend {
    calls: Mutex<Vec<&'static str>>,
    providers: Mutex<Vec<ProviderSummary>>,
    name_matches: Mutex<Vec<ProviderSummary>>,
    name_suggestions: Mutex<Vec<ProviderSummary>>,
    intent: Mutex<SearchIntentResponse>,
    hold_requests: Mutex<Vec<CreateHoldRequest>>,
    fail_hold: Mutex<bool>,
    fail_book: Mutex<bool>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            providers: Mutex::new(Vec::new()),
            name_matches: Mutex::new(Vec::new()),
            name_suggestions: Mutex::new(Vec::new()),
            intent: Mutex::new(SearchIntentResponse {
                escalate: false,
                safety_message: None,
                visit_reason_code: Some("PCP_ROUTINE".into()),
                visit_reason_label: Some("routine primary care".into()),
                recommended_provider_type: Some(ProviderType::PrimaryCare),
                confidence: Some("high".into()),
                follow_up_questions: vec![],
            }),
            hold_requests: Mutex::new(Vec::new()),
            fail_hold: Mutex::new(false),
            fail_book: Mutex::new(false),
        }
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SchedulingApi for MockBackend {
    async fn search_intent(
        &self,
        _req: &SearchIntentRequest,
    ) -> Result<SearchIntentResponse, ApiError> {
        self.record("search_intent");
        Ok(self.intent.lock().unwrap().clone())
    }

    async fn care_options(
        &self,
        _visit_reason_code: &str,
        recommended: ProviderType,
    ) -> Result<Vec<CareOption>, ApiError> {
        self.record("care_options");
        Ok(vec![
            CareOption {
                provider_type: ProviderType::UrgentCare,
                label: "Urgent Care (same-day / acute)".into(),
                suggested: recommended == ProviderType::UrgentCare,
            },
            CareOption {
                provider_type: ProviderType::PrimaryCare,
                label: "Primary Care (ongoing / general)".into(),
                suggested: recommended == ProviderType::PrimaryCare,
            },
        ])
    }

    async fn providers(
        &self,
        provider_type: ProviderType,
        limit: usize,
        _mode: Option<VisitMode>,
    ) -> Result<Vec<ProviderSummary>, ApiError> {
        self.record("providers");
        let providers = self.providers.lock().unwrap();
        Ok(providers
            .iter()
            .filter(|p| p.provider_type == provider_type)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn provider_search(
        &self,
        _query: &str,
        _limit: usize,
        _mode: Option<VisitMode>,
    ) -> Result<ProviderSearchResponse, ApiError> {
        self.record("provider_search");
        Ok(ProviderSearchResponse {
            providers: self.name_matches.lock().unwrap().clone(),
            suggestions: self.name_suggestions.lock().unwrap().clone(),
        })
    }

    async fn availability(
        &self,
        _provider_type: ProviderType,
        _days: u32,
        _mode: VisitMode,
        _visit_reason_code: &str,
    ) -> Result<Vec<AvailabilitySlot>, ApiError> {
        self.record("availability");
        Ok(vec![])
    }

    async fn create_hold(&self, req: &CreateHoldRequest) -> Result<CreateHoldResponse, ApiError> {
        self.record("create_hold");
        if *self.fail_hold.lock().unwrap() {
            return Err(ApiError::Status {
                status: 409,
                detail: "Slot is currently on hold".into(),
            });
        }
        self.hold_requests.lock().unwrap().push(req.clone());
        Ok(CreateHoldResponse {
            hold_id: format!("hold_{}", self.hold_requests.lock().unwrap().len()),
            expires_at: Utc::now() + chrono::Duration::minutes(5),
        })
    }

    async fn book_appointment(
        &self,
        req: &BookAppointmentRequest,
    ) -> Result<BookAppointmentResponse, ApiError> {
        self.record("book_appointment");
        if *self.fail_book.lock().unwrap() {
            return Err(ApiError::Http("connection reset".into()));
        }
        // Echo the held slot back, as the backend does when consuming a hold.
        let holds = self.hold_requests.lock().unwrap();
        let hold = holds.last().expect("a hold was created");
        assert_eq!(req.hold_id, format!("hold_{}", holds.len()));
        let providers = self.providers.lock().unwrap();
        let provider = providers
            .iter()
            .find(|p| p.provider_id == hold.provider_id)
            .expect("held provider exists");
        Ok(BookAppointmentResponse {
            appointment_id: "appt_123".into(),
            provider_name: provider.name.clone(),
            location_name: provider.location_name.clone(),
            start: hold.start,
            end: hold.start + chrono::Duration::minutes(30),
            mode: hold.mode,
            status: "confirmed".into(),
        })
    }
}

// ── Mock geolocation ────────────────────────────────────────────────

struct GrantedLocation;

#[async_trait]
impl LocationService for GrantedLocation {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Ok(Coordinates {
            latitude: 41.8781,
            longitude: -87.6298,
        })
    }

    async fn reverse_geocode(&self, _coords: Coordinates) -> Result<String, GeoError> {
        Ok("Chicago, IL".into())
    }
}

struct DeniedLocation;

#[async_trait]
impl LocationService for DeniedLocation {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Err(GeoError::Denied)
    }

    async fn reverse_geocode(&self, _coords: Coordinates) -> Result<String, GeoError> {
        unreachable!()
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn cardiologist() -> ProviderSummary {
    ProviderSummary {
        provider_id: "prov_7".into(),
        name: "Dr. Priya Nair".into(),
        provider_type: ProviderType::Cardiology,
        accepts_virtual: false,
        location_name: "Downtown Clinic".into(),
        location_city: "Chicago".into(),
        location_state: "IL".into(),
        next_available_start: Some(Utc.with_ymd_and_hms(2026, 9, 1, 14, 0, 0).unwrap()),
        next_available_mode: Some(VisitMode::InPerson),
        availability_label: Some("Next: Tue 9:00 AM (In person)".into()),
    }
}

fn controller_with(
    backend: Arc<MockBackend>,
    location: Arc<dyn LocationService>,
) -> FlowController {
    FlowController::new(backend, location, OrchestratorConfig::default())
}

fn assistant_texts(controller: &FlowController) -> Vec<String> {
    controller
        .session()
        .transcript
        .iter()
        .filter(|m| m.role == MessageRole::Assistant)
        .map(|m| m.text.clone())
        .collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn cardiologist_near_me_end_to_end() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![cardiologist()];
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("Find a cardiologist near me")
        .await
        .unwrap();

    assert_eq!(controller.session().flow, Flow::ProviderDiscovery);
    let texts = assistant_texts(&controller);
    assert!(texts[0].contains("cardiology"), "intro names the specialty");
    assert!(texts[0].contains("near you"), "intro names the location");
    assert_eq!(controller.session().turn.provider_matches.len(), 1);
    assert_eq!(
        controller.session().turn.provider_matches[0]
            .provider
            .provider_id,
        "prov_7"
    );
    assert_eq!(backend.calls(), vec!["providers"]);
}

#[tokio::test]
async fn insurance_classification_beats_symptom() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("Which doctors accept my insurance? I have a fever.")
        .await
        .unwrap();

    assert_eq!(controller.session().flow, Flow::InsuranceSelection);
    let picker = controller.session().transcript.last().unwrap();
    assert_eq!(picker.kind, MessageKind::InsurancePicker);
    assert_eq!(picker.options.len(), 5);
    assert!(backend.calls().is_empty(), "classification is local");
}

#[tokio::test]
async fn insurance_plan_selection_prompts_for_care_type_then_filters() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![ProviderSummary {
        provider_type: ProviderType::Dermatology,
        provider_id: "prov_3".into(),
        name: "Dr. Sofia Kim".into(),
        ..cardiologist()
    }];
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("Which providers take my insurance plan?")
        .await
        .unwrap();
    controller.select_insurance_plan("Aetna").unwrap();

    let texts = assistant_texts(&controller);
    assert!(texts.last().unwrap().contains("Aetna (AET)"));
    assert!(texts.last().unwrap().contains("What type of care"));

    controller
        .choose_care_type(ProviderType::Dermatology)
        .await
        .unwrap();

    assert_eq!(controller.session().flow, Flow::ProviderDiscovery);
    let texts = assistant_texts(&controller);
    let intro = &texts[texts.len() - 2];
    assert!(intro.contains("dermatology"));
    assert!(intro.contains("that accept Aetna"));
}

#[tokio::test]
async fn escalation_short_circuits_the_turn() {
    let backend = Arc::new(MockBackend::new());
    backend.intent.lock().unwrap().escalate = true;
    backend.intent.lock().unwrap().safety_message =
        Some("Chest pain can be an emergency. Call 911.".into());
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    let before = controller.session().transcript.len();
    controller
        .handle_turn("I need to see someone about my heart")
        .await
        .unwrap();

    // Exactly the user entry plus the safety message, nothing else.
    assert_eq!(controller.session().transcript.len(), before + 2);
    let texts = assistant_texts(&controller);
    assert_eq!(texts, vec!["Chest pain can be an emergency. Call 911.".to_string()]);
    // No discovery or care-options call after escalation.
    assert_eq!(backend.calls(), vec!["search_intent"]);
    assert_eq!(controller.session().flow, Flow::Idle);
}

#[tokio::test]
async fn escalation_without_message_uses_default() {
    let backend = Arc::new(MockBackend::new());
    backend.intent.lock().unwrap().escalate = true;
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller.handle_turn("please help").await.unwrap();
    let texts = assistant_texts(&controller);
    assert!(texts[0].contains("call 911"));
}

#[tokio::test]
async fn generic_intent_acknowledges_signals_and_asks_one_follow_up() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("I'd like a virtual appointment for my daughter")
        .await
        .unwrap();

    assert_eq!(controller.session().flow, Flow::GenericIntent);
    let texts = assistant_texts(&controller);
    assert!(texts[0].contains("pediatric-friendly"));
    assert!(texts[0].contains("virtual visit"));
    assert!(texts[0].contains("routine primary care"));
    // Mode is now known, urgency is not — exactly one follow-up prompt.
    assert!(texts[1].contains("urgent"));
    let follow_ups: Vec<&String> = texts.iter().filter(|t| t.contains('?')).collect();
    assert_eq!(follow_ups.len(), 1);
    assert!(backend.calls().contains(&"care_options"));
}

#[tokio::test]
async fn triage_walks_questions_and_summarizes_in_order() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("I have a fever and a cough")
        .await
        .unwrap();
    assert_eq!(controller.session().flow, Flow::SymptomTriage);

    controller.answer_symptom("1-3 days").unwrap();
    controller.answer_symptom("Mild fever").unwrap();
    controller.answer_symptom("No").unwrap();

    let texts = assistant_texts(&controller);
    let summary = &texts[texts.len() - 2];
    let d = summary.find("1-3 days").unwrap();
    let f = summary.find("Mild fever").unwrap();
    assert!(d < f, "answers enumerate in question order");
    assert!(summary.contains("difficulty breathing"));

    // Geolocation denied → "near you" fallback in the closing message.
    let closing = texts.last().unwrap();
    assert!(closing.contains("near you"));
}

#[tokio::test]
async fn triage_closing_uses_resolved_location() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = controller_with(backend.clone(), Arc::new(GrantedLocation));

    controller.handle_turn("I have a sore throat").await.unwrap();
    // Let the fire-and-forget geolocation land.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        controller.geo_status(),
        GeoStatus::Granted {
            label: "Chicago, IL".into()
        }
    );

    controller.answer_symptom("Less than a day").unwrap();
    controller.answer_symptom("No fever").unwrap();
    controller.answer_symptom("No").unwrap();

    let texts = assistant_texts(&controller);
    assert!(texts.last().unwrap().contains("in Chicago, IL"));
}

#[tokio::test]
async fn new_turn_clears_prior_flow_state() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![cardiologist()];
    let mut controller = controller_with(backend.clone(), Arc::new(GrantedLocation));

    controller.handle_turn("I have a rash").await.unwrap();
    controller.answer_symptom("1-3 days").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(controller.geo_status(), GeoStatus::Granted { .. }));

    controller
        .handle_turn("Find a cardiologist near me")
        .await
        .unwrap();

    assert_eq!(controller.session().flow, Flow::ProviderDiscovery);
    assert_eq!(controller.session().turn.triage.answered(), 0);
    assert_eq!(controller.geo_status(), GeoStatus::Idle);
}

#[tokio::test]
async fn hold_then_booking_references_held_slot() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![cardiologist()];
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("Find a cardiologist near me")
        .await
        .unwrap();
    controller.hold_slot("prov_7", 0).await.unwrap();

    assert_eq!(controller.session().flow, Flow::AppointmentHold);
    let hold = controller.current_hold().expect("hold active");
    let expected_start = Utc.with_ymd_and_hms(2026, 9, 1, 14, 0, 0).unwrap();
    assert_eq!(hold.provider_id, "prov_7");
    assert_eq!(hold.slot.start, expected_start);

    let patient = PatientDemographics {
        first_name: "Ana".into(),
        last_name: "Reyes".into(),
        dob: chrono::NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        phone: "312-555-0100".into(),
        email: None,
    };
    controller.confirm_booking(&patient, None).await.unwrap();

    let sent = backend.hold_requests.lock().unwrap();
    assert_eq!(sent[0].provider_id, "prov_7");
    assert_eq!(sent[0].start, expected_start);
    drop(sent);

    assert!(controller.current_hold().is_none(), "hold consumed");
    let last = controller.session().transcript.last().unwrap();
    assert_eq!(last.kind, MessageKind::Success);
    assert!(last.text.contains("Dr. Priya Nair"));
    assert!(last.text.contains("appt_123"));
}

#[tokio::test]
async fn booking_without_hold_changes_nothing() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));
    controller.handle_turn("hello there friend").await.unwrap();

    let transcript_before = controller.session().transcript.len();
    let flow_before = controller.session().flow;
    let patient = PatientDemographics {
        first_name: "Ana".into(),
        last_name: "Reyes".into(),
        dob: chrono::NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        phone: "312-555-0100".into(),
        email: None,
    };
    controller.confirm_booking(&patient, None).await.unwrap();

    assert_eq!(controller.session().transcript.len(), transcript_before);
    assert_eq!(controller.session().flow, flow_before);
    assert!(!backend.calls().contains(&"book_appointment"));
}

#[tokio::test]
async fn failed_hold_reports_status_without_state_change() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![cardiologist()];
    *backend.fail_hold.lock().unwrap() = true;
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("Find a cardiologist near me")
        .await
        .unwrap();
    controller.hold_slot("prov_7", 0).await.unwrap();

    assert!(controller.current_hold().is_none());
    let last = controller.session().transcript.last().unwrap();
    assert!(last.text.starts_with("Hold failed:"));
    assert!(last.text.contains("on hold"));
    // discovery results are still usable for another attempt
    assert_eq!(controller.session().turn.provider_matches.len(), 1);
}

#[tokio::test]
async fn failed_booking_keeps_hold_for_retry() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![cardiologist()];
    *backend.fail_book.lock().unwrap() = true;
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("Find a cardiologist near me")
        .await
        .unwrap();
    controller.hold_slot("prov_7", 0).await.unwrap();

    let patient = PatientDemographics {
        first_name: "Ana".into(),
        last_name: "Reyes".into(),
        dob: chrono::NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
        phone: "312-555-0100".into(),
        email: None,
    };
    controller.confirm_booking(&patient, None).await.unwrap();

    assert!(controller.current_hold().is_some(), "hold retained");
    let last = controller.session().transcript.last().unwrap();
    assert!(last.text.starts_with("Booking failed:"));
}

#[tokio::test]
async fn provider_name_lookup_with_results_enters_discovery() {
    let backend = Arc::new(MockBackend::new());
    *backend.name_matches.lock().unwrap() = vec![ProviderSummary {
        name: "Dr. John Smith".into(),
        provider_id: "prov_11".into(),
        provider_type: ProviderType::PrimaryCare,
        ..cardiologist()
    }];
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller.handle_turn("Dr John Smith").await.unwrap();

    assert_eq!(controller.session().flow, Flow::ProviderDiscovery);
    assert_eq!(backend.calls(), vec!["provider_search"]);
    let texts = assistant_texts(&controller);
    assert!(texts[0].contains("matching 'Dr John Smith'"));
}

#[tokio::test]
async fn provider_name_lookup_suggestions_get_distinguishing_message() {
    let backend = Arc::new(MockBackend::new());
    *backend.name_suggestions.lock().unwrap() = vec![ProviderSummary {
        name: "Dr. Alicia Johnson".into(),
        provider_id: "prov_12".into(),
        ..cardiologist()
    }];
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller.handle_turn("Johnsen").await.unwrap();

    assert_eq!(controller.session().flow, Flow::ProviderDiscovery);
    let texts = assistant_texts(&controller);
    assert!(texts[0].contains("No exact match"));
    assert!(texts[0].contains("similar names"));
    assert_eq!(controller.session().turn.provider_matches.len(), 1);
}

#[tokio::test]
async fn empty_name_lookup_falls_through_to_generic() {
    let backend = Arc::new(MockBackend::new());
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller.handle_turn("Grimaldi").await.unwrap();

    // name search found nothing by that shape → generic intent ran
    assert_eq!(controller.session().flow, Flow::GenericIntent);
    let calls = backend.calls();
    assert_eq!(calls[0], "provider_search");
    assert!(calls.contains(&"search_intent"));
}

#[tokio::test]
async fn next_available_request_checks_live_calendar() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![ProviderSummary {
        provider_type: ProviderType::PrimaryCare,
        ..cardiologist()
    }];
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    controller
        .handle_turn("What's the next available appointment?")
        .await
        .unwrap();

    assert_eq!(controller.session().flow, Flow::ProviderDiscovery);
    let calls = backend.calls();
    assert!(calls.contains(&"availability"));
    let texts = assistant_texts(&controller);
    assert!(texts[0].contains("next available"));
    assert!(texts[0].contains("primary care"));
}

#[tokio::test]
async fn synthesized_slots_cover_providers_without_calendar() {
    let backend = Arc::new(MockBackend::new());
    *backend.providers.lock().unwrap() = vec![ProviderSummary {
        next_available_start: None,
        next_available_mode: None,
        ..cardiologist()
    }];
    let mut controller = controller_with(backend.clone(), Arc::new(DeniedLocation));

    let before = Utc::now();
    controller
        .handle_turn("Find a cardiologist near me")
        .await
        .unwrap();

    let slots = &controller.session().turn.provider_matches[0].slots;
    assert_eq!(slots.len(), 4);
    // 0/30/60/90-minute offsets from roughly one hour out
    for (i, slot) in slots.iter().enumerate() {
        assert_eq!(
            slot.start - slots[0].start,
            chrono::Duration::minutes(30 * i as i64)
        );
        // the provider does not accept virtual → in-person default
        assert_eq!(slot.mode, VisitMode::InPerson);
    }
    assert!(slots[0].start >= before + chrono::Duration::minutes(59));
    assert!(slots[0].start <= Utc::now() + chrono::Duration::minutes(61));
}

#[tokio::test]
async fn collaborator_failure_surfaces_as_assistant_error() {
    struct FailingBackend;

    #[async_trait]
    impl SchedulingApi for FailingBackend {
        async fn search_intent(
            &self,
            _req: &SearchIntentRequest,
        ) -> Result<SearchIntentResponse, ApiError> {
            Err(ApiError::Http("connection refused".into()))
        }

        async fn care_options(
            &self,
            _visit_reason_code: &str,
            _recommended: ProviderType,
        ) -> Result<Vec<CareOption>, ApiError> {
            Err(ApiError::Http("connection refused".into()))
        }

        async fn providers(
            &self,
            _provider_type: ProviderType,
            _limit: usize,
            _mode: Option<VisitMode>,
        ) -> Result<Vec<ProviderSummary>, ApiError> {
            Err(ApiError::Http("connection refused".into()))
        }

        async fn provider_search(
            &self,
            _query: &str,
            _limit: usize,
            _mode: Option<VisitMode>,
        ) -> Result<ProviderSearchResponse, ApiError> {
            Err(ApiError::Http("connection refused".into()))
        }

        async fn availability(
            &self,
            _provider_type: ProviderType,
            _days: u32,
            _mode: VisitMode,
            _visit_reason_code: &str,
        ) -> Result<Vec<AvailabilitySlot>, ApiError> {
            Err(ApiError::Http("connection refused".into()))
        }

        async fn create_hold(
            &self,
            _req: &CreateHoldRequest,
        ) -> Result<CreateHoldResponse, ApiError> {
            Err(ApiError::Http("connection refused".into()))
        }

        async fn book_appointment(
            &self,
            _req: &BookAppointmentRequest,
        ) -> Result<BookAppointmentResponse, ApiError> {
            Err(ApiError::Http("connection refused".into()))
        }
    }

    let mut controller = FlowController::new(
        Arc::new(FailingBackend),
        Arc::new(DeniedLocation),
        OrchestratorConfig::default(),
    );

    controller
        .handle_turn("Find a cardiologist near me")
        .await
        .unwrap();

    // the failure is an assistant entry, the session stays usable
    assert_eq!(controller.session().flow, Flow::Idle);
    assert!(!controller.is_searching());
    let texts = assistant_texts(&controller);
    assert!(texts[0].contains("something went wrong"));
    assert!(texts[0].contains("connection refused"));

    // next turn still works
    controller.handle_turn("hello").await.unwrap();
    assert_eq!(controller.session().transcript.len(), 4);
}
