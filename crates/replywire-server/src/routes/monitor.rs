//! Monitoring control routes — start/stop, one-off scrape, manual reply.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::warn;

use crate::state::AppState;
use replywire_page::PageDriver;
use replywire_router::{AgentRequest, RouterResponse};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/monitor/start", post(start_monitoring))
        .route("/monitor/stop", post(stop_monitoring))
        .route("/scrape", post(scrape_once))
        .route("/reply", post(relay_reply))
        .route("/relay-selection", post(relay_selection))
}

#[derive(Debug, Deserialize)]
struct ContextBody {
    #[serde(rename = "contextId")]
    context_id: String,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    #[serde(rename = "contextId")]
    context_id: String,
    text: String,
}

async fn start_monitoring(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContextBody>,
) -> Json<RouterResponse> {
    let selectors = state.effective_selectors();
    if selectors.is_empty() {
        return Json(RouterResponse::failure(
            "Please enter at least one valid selector",
        ));
    }

    let response = state
        .router
        .forward(
            &body.context_id,
            AgentRequest::StartMonitoring {
                selectors,
                endpoint: state.endpoint(),
            },
        )
        .await;

    if response.success {
        persist_monitoring_flag(&state, true);
    }
    Json(response)
}

async fn stop_monitoring(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContextBody>,
) -> Json<RouterResponse> {
    let response = state
        .router
        .forward(&body.context_id, AgentRequest::StopMonitoring)
        .await;

    if response.success {
        persist_monitoring_flag(&state, false);
    }
    Json(response)
}

async fn scrape_once(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ContextBody>,
) -> Json<RouterResponse> {
    let selectors = state.effective_selectors();
    if selectors.is_empty() {
        return Json(RouterResponse::failure(
            "Please enter at least one valid selector",
        ));
    }

    let response = state
        .router
        .forward(
            &body.context_id,
            AgentRequest::ScrapeOnce {
                selectors,
                endpoint: state.endpoint(),
            },
        )
        .await;
    Json(response)
}

async fn relay_reply(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReplyBody>,
) -> Json<RouterResponse> {
    let response = state
        .router
        .forward(
            &body.context_id,
            AgentRequest::RelayReplyToPage { text: body.text },
        )
        .await;
    Json(response)
}

/// Relay an operator-selected snippet straight to the endpoint, tagged so
/// the receiver can tell it apart from monitored messages.
async fn relay_selection(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ReplyBody>,
) -> Json<RouterResponse> {
    let endpoint = state.endpoint();
    if endpoint.is_empty() {
        return Json(RouterResponse::failure("No endpoint configured"));
    }
    let source = match state.pages.read().get(&body.context_id) {
        Some(page) => page.url(),
        None => {
            return Json(RouterResponse::failure(format!(
                "no page context registered for '{}'",
                body.context_id
            )))
        }
    };

    match state
        .sessions
        .relay_selection(&body.text, &source, &endpoint)
        .await
    {
        Ok(response) => Json(RouterResponse::ok_with(serde_json::json!({
            "reply": response.reply,
        }))),
        Err(e) => Json(RouterResponse::failure(e.to_string())),
    }
}

/// The persisted flag is the durable source of truth that sessions
/// reconstruct from after a restart.
fn persist_monitoring_flag(state: &AppState, monitoring: bool) {
    let mut settings = state.settings.write();
    if settings.is_monitoring != monitoring {
        settings.is_monitoring = monitoring;
        if let Err(e) = settings.save() {
            warn!("Failed to persist monitoring flag: {}", e);
        }
    }
}
