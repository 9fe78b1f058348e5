//! Hold → booking lifecycle.
//!
//! NoHold → Holding → Booked, with a failed branch at either transition
//! that leaves prior state untouched: a failed hold keeps whatever hold
//! existed before, and a failed booking keeps the hold so the user can
//! retry. Booking without an active hold is a guarded no-op, never a
//! user-visible error.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::api::{
    BookAppointmentRequest, CreateHoldRequest, PatientDemographics, ProviderSummary, SchedulingApi,
};
use crate::error::ApiError;
use crate::session::AppointmentSlot;

/// A time-limited reservation of a provider slot.
#[derive(Debug, Clone)]
pub struct Hold {
    pub id: String,
    pub expires_at: DateTime<Utc>,
    pub provider_id: String,
    pub provider_name: String,
    pub location_name: String,
    pub slot: AppointmentSlot,
}

impl Hold {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A confirmed appointment. Terminal.
#[derive(Debug, Clone)]
pub struct Booking {
    pub id: String,
    pub provider_name: String,
    pub location_name: String,
    pub slot: AppointmentSlot,
    pub confirmed: bool,
}

/// Tracks at most one active hold per session and the booking it becomes.
#[derive(Debug, Default)]
pub struct BookingLifecycle {
    hold: Option<Hold>,
    booking: Option<Booking>,
}

impl BookingLifecycle {
    pub fn hold(&self) -> Option<&Hold> {
        self.hold.as_ref()
    }

    pub fn booking(&self) -> Option<&Booking> {
        self.booking.as_ref()
    }

    /// Drop all lifecycle state (turn reset).
    pub fn clear(&mut self) {
        self.hold = None;
        self.booking = None;
    }

    /// Reserve a slot. On success the new hold replaces any prior one
    /// (the backend enforces actual reservation exclusivity); on failure
    /// prior state is untouched.
    pub async fn create_hold(
        &mut self,
        api: &dyn SchedulingApi,
        session_id: &str,
        provider: &ProviderSummary,
        slot: AppointmentSlot,
        visit_reason_code: &str,
    ) -> Result<&Hold, ApiError> {
        let req = CreateHoldRequest {
            session_id: session_id.to_string(),
            provider_id: provider.provider_id.clone(),
            start: slot.start,
            mode: slot.mode,
            visit_reason_code: visit_reason_code.to_string(),
        };
        let resp = api.create_hold(&req).await?;
        info!(hold_id = %resp.hold_id, provider_id = %provider.provider_id, "hold created");

        self.hold = Some(Hold {
            id: resp.hold_id,
            expires_at: resp.expires_at,
            provider_id: provider.provider_id.clone(),
            provider_name: provider.name.clone(),
            location_name: provider.location_name.clone(),
            slot,
        });
        Ok(self.hold.as_ref().expect("hold just set"))
    }

    /// Confirm the booking from the active hold.
    ///
    /// Returns `Ok(None)` — a no-op — when there is no active, unexpired
    /// hold. On collaborator failure the hold is kept for retry.
    pub async fn confirm(
        &mut self,
        api: &dyn SchedulingApi,
        session_id: &str,
        patient: &PatientDemographics,
        notes: Option<String>,
    ) -> Result<Option<Booking>, ApiError> {
        let Some(hold) = self.hold.as_ref() else {
            debug!("booking requested with no active hold, ignoring");
            return Ok(None);
        };
        if hold.is_expired(Utc::now()) {
            debug!(hold_id = %hold.id, "booking requested against expired hold, ignoring");
            self.hold = None;
            return Ok(None);
        }

        let req = BookAppointmentRequest {
            session_id: session_id.to_string(),
            hold_id: hold.id.clone(),
            patient_first_name: patient.first_name.clone(),
            patient_last_name: patient.last_name.clone(),
            patient_dob: patient.dob,
            patient_phone: patient.phone.clone(),
            patient_email: patient.email.clone(),
            notes,
        };
        let resp = api.book_appointment(&req).await?;
        info!(appointment_id = %resp.appointment_id, "booking confirmed");

        let booking = Booking {
            id: resp.appointment_id,
            provider_name: resp.provider_name,
            location_name: resp.location_name,
            slot: AppointmentSlot {
                start: resp.start,
                mode: resp.mode,
            },
            confirmed: resp.status == "confirmed",
        };
        self.hold = None;
        self.booking = Some(booking.clone());
        Ok(Some(booking))
    }
}
