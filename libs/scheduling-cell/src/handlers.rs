// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use chrono::NaiveDate;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::error::SchedulingApiError;
use crate::models::{BookingRequest, Slot, wall_clock};
use crate::services::scheduling::SchedulingService;

// ==============================================================================
// QUERY / BODY STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct ShiftQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
    pub exclude_appointment_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationFitRequest {
    #[serde(alias = "provider_id")]
    pub provider_id: Uuid,
    #[serde(with = "wall_clock::date")]
    pub date: NaiveDate,
    #[serde(alias = "start_slot")]
    pub start_slot: Slot,
    #[serde(alias = "duration_minutes")]
    pub duration: u32,
    #[serde(default, alias = "exclude_appointment_id")]
    pub exclude_appointment_id: Option<Uuid>,
}

fn ensure_configured(state: &AppConfig) -> Result<(), AppError> {
    if !state.is_configured() {
        return Err(AppError::NotConfigured("Supabase connection is not configured".to_string()));
    }
    Ok(())
}

// ==============================================================================
// HANDLERS
// ==============================================================================

/// Effective working interval(s) for a provider on a date
#[axum::debug_handler]
pub async fn get_provider_shift(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<ShiftQuery>,
) -> Result<Json<Value>, SchedulingApiError> {
    ensure_configured(&state)?;

    let service = SchedulingService::new(&state);
    let intervals = service.resolve_shift(provider_id, query.date, auth.token()).await;
    let working = !intervals.is_empty();

    Ok(Json(json!({
        "providerId": provider_id,
        "date": query.date.to_string(),
        "intervals": intervals,
        "working": working,
    })))
}

/// Slot grid with availability for the calendar page
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, SchedulingApiError> {
    ensure_configured(&state)?;

    let service = SchedulingService::new(&state);
    let day = service
        .day_availability(
            provider_id,
            query.date,
            state.clinic_now(),
            query.exclude_appointment_id,
            auth.token(),
        )
        .await;
    let free_slots = day.free_slots();
    let message = day.message();

    Ok(Json(json!({
        "providerId": provider_id,
        "date": query.date.to_string(),
        "intervals": day.intervals,
        "slots": day.slots,
        "availability": day.availability,
        "freeSlots": free_slots,
        "message": message,
    })))
}

/// Called on slot selection; a short fit is a normal response, not an error
#[axum::debug_handler]
pub async fn check_duration_fit(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<DurationFitRequest>,
) -> Result<Json<Value>, SchedulingApiError> {
    ensure_configured(&state)?;

    let service = SchedulingService::new(&state);
    let fit = service
        .check_duration_fit(
            request.provider_id,
            request.date,
            request.start_slot,
            request.duration,
            state.clinic_now(),
            request.exclude_appointment_id,
            auth.token(),
        )
        .await?;

    let message = match fit.into_result() {
        Ok(_) => None,
        Err(e) => Some(e.to_string()),
    };

    Ok(Json(json!({
        "fit": fit,
        "message": message,
    })))
}

/// Submission guard: duration fit and patient conflicts, all-or-nothing
#[axum::debug_handler]
pub async fn validate_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Value>, SchedulingApiError> {
    ensure_configured(&state)?;

    let service = SchedulingService::new(&state);
    let fit = service
        .validate_booking(&request, state.clinic_now(), auth.token())
        .await?;

    Ok(Json(json!({
        "ok": true,
        "fit": fit,
        "request": request,
    })))
}
