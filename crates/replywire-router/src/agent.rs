//! Page agent — one event loop per page context, executing routed requests
//! against that context's driver and session state.

use std::sync::Arc;
use std::time::Duration;

use replywire_monitor::SessionRegistry;
use replywire_page::{inject, PageDriver};
use tokio::sync::mpsc;
use tracing::info;

use crate::actions::{AgentRequest, Envelope, RouterResponse};

/// The per-page execution context. Owns no session state directly; all
/// session mutation goes through the registry so the one-session-per-context
/// invariant has a single enforcement point.
pub struct PageAgent {
    context_id: String,
    driver: Arc<dyn PageDriver>,
    sessions: Arc<SessionRegistry>,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl PageAgent {
    pub fn new(
        context_id: impl Into<String>,
        driver: Arc<dyn PageDriver>,
        sessions: Arc<SessionRegistry>,
        poll_interval: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            context_id: context_id.into(),
            driver,
            sessions,
            poll_interval,
            settle_delay,
        }
    }

    /// Spawn the agent's event loop and return its inbox for registration
    /// with the router. Each envelope is answered exactly once. When the
    /// inbox closes (context teardown) any running session is stopped.
    pub fn spawn(self) -> mpsc::UnboundedSender<Envelope> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        tokio::spawn(async move {
            while let Some(Envelope { request, respond }) = rx.recv().await {
                let response = self.handle(request).await;
                let _ = respond.send(response);
            }
            info!("Page agent for {} shutting down", self.context_id);
            self.sessions.stop(&self.context_id);
        });
        tx
    }

    async fn handle(&self, request: AgentRequest) -> RouterResponse {
        match request {
            AgentRequest::StartMonitoring { selectors, endpoint } => {
                self.sessions
                    .start(
                        &self.context_id,
                        self.driver.clone(),
                        selectors,
                        endpoint,
                        self.poll_interval,
                        self.settle_delay,
                    )
                    .await;
                RouterResponse::ok()
            }
            AgentRequest::StopMonitoring => {
                self.sessions.stop(&self.context_id);
                RouterResponse::ok()
            }
            AgentRequest::ScrapeOnce { selectors, endpoint } => {
                let outcome = self
                    .sessions
                    .scrape_once(self.driver.clone(), &selectors, &endpoint, self.settle_delay)
                    .await;
                if outcome.result.ok {
                    let data = serde_json::to_value(&outcome)
                        .unwrap_or_else(|_| serde_json::json!({}));
                    RouterResponse::ok_with(data)
                } else {
                    RouterResponse::failure(
                        outcome
                            .result
                            .error
                            .unwrap_or_else(|| "extraction failed".into()),
                    )
                }
            }
            AgentRequest::RelayReplyToPage { text } => {
                let sent = inject(self.driver.as_ref(), &text, self.settle_delay).await;
                if sent {
                    RouterResponse::ok_with(serde_json::json!({
                        "message": "Message sent successfully",
                    }))
                } else {
                    RouterResponse::failure("Failed to send message")
                }
            }
        }
    }
}
