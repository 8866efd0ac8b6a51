//! HTTP route handlers — the control panel's API surface.

pub mod contexts;
pub mod monitor;
pub mod settings;
pub mod status;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(settings::routes())
        .merge(monitor::routes())
        .merge(contexts::routes())
        .merge(status::routes())
}
