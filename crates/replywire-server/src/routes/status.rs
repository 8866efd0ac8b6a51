//! Status routes — health probe and the monitoring indicator surface.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let indicators = state.router.indicators();
    let sessions = state.sessions.statuses();
    let contexts = state.router.registered_contexts();

    Json(serde_json::json!({
        "indicators": indicators,
        "sessions": sessions,
        "contexts": contexts,
    }))
}
