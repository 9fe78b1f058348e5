use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

use care_assist::api::http::HttpSchedulingApi;
use care_assist::api::{PatientDemographics, SchedulingApi};
use care_assist::config::OrchestratorConfig;
use care_assist::controller::FlowController;
use care_assist::error::GeoError;
use care_assist::geo::{Coordinates, LocationService, ReverseGeocodeClient};
use care_assist::session::MessageRole;

/// Environment-backed stand-in for the browser geolocation API: fixed
/// coordinates when provided, denied otherwise.
struct EnvLocationService {
    coords: Option<Coordinates>,
    geocoder: Option<ReverseGeocodeClient>,
}

impl EnvLocationService {
    fn from_env() -> Self {
        let coords = match (
            std::env::var("CARE_ASSIST_LAT").ok(),
            std::env::var("CARE_ASSIST_LON").ok(),
        ) {
            (Some(lat), Some(lon)) => match (lat.parse(), lon.parse()) {
                (Ok(latitude), Ok(longitude)) => Some(Coordinates {
                    latitude,
                    longitude,
                }),
                _ => None,
            },
            _ => None,
        };
        let geocoder = std::env::var("CARE_ASSIST_GEOCODER_URL")
            .ok()
            .map(ReverseGeocodeClient::new);
        Self { coords, geocoder }
    }
}

#[async_trait]
impl LocationService for EnvLocationService {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        self.coords.ok_or(GeoError::Unavailable)
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<String, GeoError> {
        match &self.geocoder {
            Some(client) => client.lookup(coords).await,
            None => Err(GeoError::Geocode("no geocoder configured".into())),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let base_url = std::env::var("CARE_ASSIST_API_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());

    eprintln!("🩺 Care Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {base_url}");
    eprintln!("   Type a message and press Enter. /quit to exit.");
    eprintln!("   Commands: /plan <name>, /care <type>, /answer <option>,");
    eprintln!("             /hold <provider_id> <slot#>, /book <first> <last> <dob> <phone>\n");

    let api: Arc<dyn SchedulingApi> = Arc::new(HttpSchedulingApi::new(&base_url));
    let location = Arc::new(EnvLocationService::from_env());
    let mut controller = FlowController::new(api, location, OrchestratorConfig::default());

    let stdin = tokio::io::stdin();
    let reader = BufReader::new(stdin);
    let mut lines = reader.lines();
    let mut printed = 0;

    eprint!("> ");
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            eprint!("> ");
            continue;
        }
        if line == "/quit" {
            break;
        }

        let result = if let Some(rest) = line.strip_prefix("/plan ") {
            controller.select_insurance_plan(rest.trim())
        } else if let Some(rest) = line.strip_prefix("/care ") {
            match parse_care_type(rest.trim()) {
                Some(pt) => controller.choose_care_type(pt).await,
                None => {
                    eprintln!("Unknown care type: {rest}");
                    Ok(())
                }
            }
        } else if let Some(rest) = line.strip_prefix("/answer ") {
            controller.answer_symptom(rest.trim())
        } else if let Some(rest) = line.strip_prefix("/hold ") {
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next().and_then(|s| s.parse().ok())) {
                (Some(provider_id), Some(index)) => {
                    controller.hold_slot(provider_id, index).await
                }
                _ => {
                    eprintln!("Usage: /hold <provider_id> <slot#>");
                    Ok(())
                }
            }
        } else if let Some(rest) = line.strip_prefix("/book ") {
            match parse_patient(rest) {
                Some(patient) => controller.confirm_booking(&patient, None).await,
                None => {
                    eprintln!("Usage: /book <first> <last> <yyyy-mm-dd> <phone>");
                    Ok(())
                }
            }
        } else {
            controller.handle_turn(&line).await
        };

        if let Err(e) = result {
            eprintln!("⚠️  {e}");
        }

        for message in &controller.session().transcript[printed..] {
            match message.role {
                MessageRole::User => println!("you: {}", message.text),
                MessageRole::Assistant => {
                    println!("assistant: {}", message.text);
                    if !message.options.is_empty() {
                        println!("           [{}]", message.options.join(" | "));
                    }
                }
                MessageRole::System => println!("system: {}", message.text),
            }
        }
        printed = controller.session().transcript.len();
        eprint!("> ");
    }

    Ok(())
}

fn parse_care_type(s: &str) -> Option<care_assist::api::ProviderType> {
    use care_assist::api::ProviderType;
    ProviderType::ALL
        .into_iter()
        .find(|pt| pt.to_string() == s || pt.picker_label().eq_ignore_ascii_case(s))
}

fn parse_patient(rest: &str) -> Option<PatientDemographics> {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    if parts.len() != 4 {
        return None;
    }
    Some(PatientDemographics {
        first_name: parts[0].to_string(),
        last_name: parts[1].to_string(),
        dob: parts[2].parse().ok()?,
        phone: parts[3].to_string(),
        email: None,
    })
}
