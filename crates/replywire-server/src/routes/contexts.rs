//! Hosted page context routes — register, mutate, and tear down the
//! in-memory pages the agents drive.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{delete, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::state::AppState;
use replywire_router::{AgentRequest, RouterResponse};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/contexts", post(register_context))
        .route("/contexts/{id}/html", put(update_html))
        .route("/contexts/{id}", delete(remove_context))
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    #[serde(rename = "contextId")]
    context_id: String,
    url: String,
    #[serde(default)]
    html: String,
}

#[derive(Debug, Deserialize)]
struct HtmlBody {
    html: String,
}

async fn register_context(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterBody>,
) -> Json<RouterResponse> {
    if !state.register_page(&body.context_id, &body.url, &body.html) {
        return Json(RouterResponse::failure(format!(
            "context '{}' already registered",
            body.context_id
        )));
    }

    // Persisted state says monitoring is on: the new context's session
    // reconstructs itself immediately.
    if state.settings.read().is_monitoring {
        let selectors = state.effective_selectors();
        if !selectors.is_empty() {
            info!("Resuming monitoring for new context {}", body.context_id);
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
            return Json(response);
        }
    }

    Json(RouterResponse::ok())
}

async fn update_html(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<HtmlBody>,
) -> Json<RouterResponse> {
    let page = state.pages.read().get(&id).cloned();
    match page {
        Some(page) => {
            page.set_html(body.html);
            Json(RouterResponse::ok())
        }
        None => Json(RouterResponse::failure(format!(
            "no page context registered for '{}'",
            id
        ))),
    }
}

async fn remove_context(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<RouterResponse> {
    if state.remove_page(&id) {
        Json(RouterResponse::ok())
    } else {
        Json(RouterResponse::failure(format!(
            "no page context registered for '{}'",
            id
        )))
    }
}
