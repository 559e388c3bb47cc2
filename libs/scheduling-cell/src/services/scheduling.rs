use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::{SchedulingError, SourceError};
use crate::models::{
    Appointment, BookingRequest, CustomShift, DayAvailability, DefaultShift, DurationFit, Slot,
    WorkingInterval,
};
use crate::services::availability::day_availability;
use crate::services::conflict::detect_conflicts;
use crate::services::duration::check_duration_fit;
use crate::services::shift::resolve_shift;
use crate::services::source::{AppointmentFilter, ScheduleSource, SupabaseScheduleSource};

/// Loads schedule snapshots from a [`ScheduleSource`] and runs the engine over them.
///
/// Failed fetches degrade to empty data, so a provider shows no availability instead
/// of erroring. Nothing is written.
pub struct SchedulingService<S = SupabaseScheduleSource> {
    source: S,
}

impl SchedulingService<SupabaseScheduleSource> {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_source(SupabaseScheduleSource::new(config))
    }
}

impl<S: ScheduleSource> SchedulingService<S> {
    pub fn with_source(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    async fn load_shifts(&self, provider_id: Uuid, auth_token: &str) -> (Vec<CustomShift>, Vec<DefaultShift>) {
        let (custom, default) = tokio::join!(
            self.source.custom_shifts(provider_id, auth_token),
            self.source.default_shifts(provider_id, auth_token),
        );
        (or_empty(custom), or_empty(default))
    }

    async fn load_provider_day(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> (Vec<CustomShift>, Vec<DefaultShift>, Vec<Appointment>) {
        let filter = AppointmentFilter::for_provider(provider_id).on(date);
        let ((custom, default), appointments) = tokio::join!(
            self.load_shifts(provider_id, auth_token),
            self.source.appointments(filter, auth_token),
        );
        (custom, default, or_empty(appointments))
    }

    #[instrument(skip(self, auth_token))]
    pub async fn resolve_shift(&self, provider_id: Uuid, date: NaiveDate, auth_token: &str) -> Vec<WorkingInterval> {
        let (custom, default) = self.load_shifts(provider_id, auth_token).await;
        resolve_shift(provider_id, date, &custom, &default)
    }

    /// Slots and their free/occupied state. `exclude_appointment_id` hides the
    /// appointment being edited so its own time reads as free.
    #[instrument(skip(self, auth_token))]
    pub async fn day_availability(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        now: NaiveDateTime,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> DayAvailability {
        let (custom, default, mut appointments) = self.load_provider_day(provider_id, date, auth_token).await;
        if let Some(excluded) = exclude_appointment_id {
            appointments.retain(|appointment| appointment.id != excluded);
        }

        let day = day_availability(provider_id, date, now, &custom, &default, &appointments);
        if day.has_no_slots() {
            info!("No available time slots for provider {} on {}", provider_id, date);
        }
        day
    }

    #[instrument(skip(self, auth_token))]
    pub async fn check_duration_fit(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        start_slot: Slot,
        duration_minutes: u32,
        now: NaiveDateTime,
        exclude_appointment_id: Option<Uuid>,
        auth_token: &str,
    ) -> Result<DurationFit, SchedulingError> {
        validate_duration(duration_minutes)?;
        let day = self
            .day_availability(provider_id, date, now, exclude_appointment_id, auth_token)
            .await;
        Ok(check_duration_fit(&day, start_slot, duration_minutes))
    }

    /// Final check before the booking is submitted: the duration must fit, then the
    /// patient must have no conflicting booking. Returns the passing fit.
    #[instrument(skip(self, request, auth_token), fields(patient_id = %request.patient_id, provider_id = %request.provider_id))]
    pub async fn validate_booking(
        &self,
        request: &BookingRequest,
        now: NaiveDateTime,
        auth_token: &str,
    ) -> Result<DurationFit, SchedulingError> {
        validate_duration(request.duration)?;

        let (day, patient_appointments) = tokio::join!(
            self.day_availability(
                request.provider_id,
                request.date,
                now,
                request.exclude_appointment_id,
                auth_token,
            ),
            self.source.appointments(AppointmentFilter::for_patient(request.patient_id), auth_token),
        );

        let fit = check_duration_fit(&day, request.start_slot, request.duration).into_result()?;

        // Both conflict rules are keyed on the patient, so the patient's bookings are the
        // full relevant set.
        detect_conflicts(request, &or_empty(patient_appointments))?;

        debug!(
            "Booking for patient {} at {} {} passed all checks",
            request.patient_id, request.date, request.start_slot
        );
        Ok(fit)
    }
}

fn validate_duration(duration_minutes: u32) -> Result<(), SchedulingError> {
    if duration_minutes == 0 {
        return Err(SchedulingError::InvalidDuration(duration_minutes));
    }
    Ok(())
}

fn or_empty<T>(result: Result<Vec<T>, SourceError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("{}; treating as empty", e);
        Vec::new()
    })
}
