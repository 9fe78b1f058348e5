//! Geolocation resolution for the triage flow.
//!
//! The position source is a collaborator behind [`LocationService`]; the
//! resolver owns the status machine (idle → locating → granted | denied)
//! and a cancellation token tied to session reset, so a resolution that
//! lands after the flow has moved on is structurally impossible to apply.
//! Reverse geocoding prefers a city/state label and falls back to raw
//! coordinates; denial or absence resolves to `Denied`, never a hang.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::GeoError;

/// A raw position fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Geolocation progress for the session. Transitions only move forward
/// within a turn; a session reset returns to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoStatus {
    Idle,
    Locating,
    Granted { label: String },
    Denied,
}

/// Position + reverse-geocoding collaborator.
#[async_trait]
pub trait LocationService: Send + Sync {
    /// Resolve the device position. Errors mean denial or unavailability.
    async fn current_position(&self) -> Result<Coordinates, GeoError>;

    /// Resolve coordinates to a human-readable "City, ST" label.
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<String, GeoError>;
}

/// Third-party reverse-geocoding client (JSON over HTTP).
pub struct ReverseGeocodeClient {
    base_url: String,
    client: reqwest::Client,
}

impl ReverseGeocodeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Look up a city/state label for coordinates.
    pub async fn lookup(&self, coords: Coordinates) -> Result<String, GeoError> {
        #[derive(serde::Deserialize)]
        struct Body {
            #[serde(default)]
            city: Option<String>,
            #[serde(default)]
            state: Option<String>,
        }
        let resp = self
            .client
            .get(format!("{}/reverse", self.base_url))
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
            ])
            .send()
            .await
            .map_err(|e| GeoError::Geocode(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(GeoError::Geocode(format!("HTTP {}", resp.status().as_u16())));
        }
        let body: Body = resp
            .json()
            .await
            .map_err(|e| GeoError::Geocode(e.to_string()))?;
        match (body.city, body.state) {
            (Some(city), Some(state)) => Ok(format!("{city}, {state}")),
            (Some(city), None) => Ok(city),
            _ => Err(GeoError::Geocode("no place name in response".to_string())),
        }
    }
}

/// Format raw coordinates as the fallback label.
pub fn coordinate_label(coords: Coordinates) -> String {
    format!("{:.4}, {:.4}", coords.latitude, coords.longitude)
}

/// Owns the session's geolocation status and the in-flight resolution.
pub struct GeoResolver {
    service: Arc<dyn LocationService>,
    state: Arc<Mutex<GeoStatus>>,
    token: CancellationToken,
}

impl GeoResolver {
    pub fn new(service: Arc<dyn LocationService>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(GeoStatus::Idle)),
            token: CancellationToken::new(),
        }
    }

    pub fn status(&self) -> GeoStatus {
        self.state.lock().expect("geo state lock").clone()
    }

    /// The resolved label, when granted.
    pub fn location_label(&self) -> Option<String> {
        match self.status() {
            GeoStatus::Granted { label } => Some(label),
            _ => None,
        }
    }

    /// Session reset: cancel any in-flight resolution and return to idle.
    pub fn reset(&mut self) {
        self.token.cancel();
        self.token = CancellationToken::new();
        *self.state.lock().expect("geo state lock") = GeoStatus::Idle;
    }

    /// Fire-and-forget resolution. No-op unless the status is idle.
    pub fn request(&self) {
        {
            let mut state = self.state.lock().expect("geo state lock");
            if *state != GeoStatus::Idle {
                return;
            }
            *state = GeoStatus::Locating;
        }

        let service = Arc::clone(&self.service);
        let state = Arc::clone(&self.state);
        let token = self.token.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = token.cancelled() => return,
                outcome = resolve_label(service.as_ref()) => outcome,
            };
            // The token can be cancelled between resolution and commit.
            if token.is_cancelled() {
                debug!("discarding stale geolocation result");
                return;
            }
            let mut state = state.lock().expect("geo state lock");
            *state = match outcome {
                Ok(label) => GeoStatus::Granted { label },
                Err(e) => {
                    debug!(error = %e, "geolocation denied/unavailable");
                    GeoStatus::Denied
                }
            };
        });
    }
}

/// Position → label, preferring the reverse-geocoded place name and
/// falling back to raw coordinates when geocoding fails.
async fn resolve_label(service: &dyn LocationService) -> Result<String, GeoError> {
    let coords = service.current_position().await?;
    Ok(match service.reverse_geocode(coords).await {
        Ok(label) => label,
        Err(e) => {
            debug!(error = %e, "reverse geocoding failed, using coordinates");
            coordinate_label(coords)
        }
    })
}
