// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use shared_config::AppConfig;

use crate::handlers;

pub fn scheduling_routes(state: Arc<AppConfig>) -> Router {
    // Every route forwards the caller's bearer token to Supabase
    Router::new()
        .route("/providers/{provider_id}/shift", get(handlers::get_provider_shift))
        .route("/providers/{provider_id}/slots", get(handlers::get_available_slots))
        .route("/duration-fit", post(handlers::check_duration_fit))
        .route("/bookings/validate", post(handlers::validate_booking))
        .with_state(state)
}
