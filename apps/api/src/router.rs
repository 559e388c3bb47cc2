use std::sync::Arc;

use axum::{
    Json,
    Router,
    routing::get,
};
use serde_json::json;

use scheduling_cell::router::scheduling_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let configured = state.is_configured();

    Router::new()
        .route("/", get(|| async { "Clinic Scheduling API is running!" }))
        .route("/health", get(move || async move {
            Json(json!({
                "status": if configured { "ok" } else { "degraded" },
                "supabase_configured": configured,
            }))
        }))
        .nest("/scheduling", scheduling_routes(state.clone()))
}
