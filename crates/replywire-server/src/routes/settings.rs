//! Settings routes — the persisted configuration store behind the panel.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use tracing::warn;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let settings = state.settings.read();
    Json(serde_json::to_value(&*settings).unwrap_or_default())
}

/// Partial update; unknown fields are ignored. Every accepted change is
/// persisted immediately.
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(updates): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    let mut settings = state.settings.write();
    let changed = settings.apply_updates(&updates);
    if changed {
        if let Err(e) = settings.save() {
            warn!("Failed to persist settings: {}", e);
        }
    }
    Json(serde_json::json!({
        "success": true,
        "changed": changed,
    }))
}
