use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::Slot;

/// Blocking outcomes of the booking checks. Returned as values, shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("The selected time has only {available_minutes} of the requested {requested_minutes} minutes available. Please choose another time slot.")]
    InsufficientTime { requested_minutes: u32, available_minutes: u32 },

    #[error("{patient} already has an appointment with this provider on {date}")]
    DuplicateAppointment {
        patient: String,
        date: NaiveDate,
        existing_appointment_id: Uuid,
    },

    #[error("The patient is already booked with {provider} on {date} at {time} ({duration_minutes} minutes)")]
    TimeSlotConflict {
        provider: String,
        date: NaiveDate,
        time: Slot,
        duration_minutes: u32,
        existing_appointment_id: Uuid,
    },

    #[error("Invalid time slot: {0}")]
    InvalidSlot(String),

    #[error("Invalid appointment duration: {0} minutes")]
    InvalidDuration(u32),
}

impl SchedulingError {
    pub fn code(&self) -> &'static str {
        match self {
            SchedulingError::InsufficientTime { .. } => "insufficient_time",
            SchedulingError::DuplicateAppointment { .. } => "duplicate_appointment",
            SchedulingError::TimeSlotConflict { .. } => "time_slot_conflict",
            SchedulingError::InvalidSlot(_) => "invalid_slot",
            SchedulingError::InvalidDuration(_) => "invalid_duration",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SchedulingError::InsufficientTime { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            SchedulingError::DuplicateAppointment { .. }
            | SchedulingError::TimeSlotConflict { .. } => StatusCode::CONFLICT,
            SchedulingError::InvalidSlot(_) | SchedulingError::InvalidDuration(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn details(&self) -> Value {
        match self {
            SchedulingError::InsufficientTime { requested_minutes, available_minutes } => json!({
                "requestedMinutes": requested_minutes,
                "availableMinutes": available_minutes,
            }),
            SchedulingError::DuplicateAppointment { patient, date, existing_appointment_id } => json!({
                "patient": patient,
                "date": date.to_string(),
                "existingAppointmentId": existing_appointment_id,
            }),
            SchedulingError::TimeSlotConflict { provider, date, time, duration_minutes, existing_appointment_id } => json!({
                "provider": provider,
                "date": date.to_string(),
                "time": time.label(),
                "durationMinutes": duration_minutes,
                "existingAppointmentId": existing_appointment_id,
            }),
            SchedulingError::InvalidSlot(raw) => json!({ "slot": raw }),
            SchedulingError::InvalidDuration(minutes) => json!({ "duration": minutes }),
        }
    }
}

impl IntoResponse for SchedulingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::warn!("Booking blocked ({}): {}", self.code(), self);

        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
            "details": self.details(),
        }));

        (status, body).into_response()
    }
}

/// Failure while loading shifts or appointments from the data layer.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to load {resource}: {message}")]
    Fetch { resource: &'static str, message: String },
}

impl SourceError {
    pub fn fetch(resource: &'static str, err: impl std::fmt::Display) -> Self {
        SourceError::Fetch { resource, message: err.to_string() }
    }
}

/// Error type for the scheduling HTTP handlers.
#[derive(Error, Debug)]
pub enum SchedulingApiError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
}

impl IntoResponse for SchedulingApiError {
    fn into_response(self) -> Response {
        match self {
            SchedulingApiError::App(err) => err.into_response(),
            SchedulingApiError::Scheduling(err) => err.into_response(),
        }
    }
}
