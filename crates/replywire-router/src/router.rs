//! The router proper — forwards typed requests to registered page agents
//! and mirrors monitoring-state transitions into the visible indicator.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use replywire_monitor::StateChange;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::actions::{AgentRequest, Envelope, RouterResponse};

/// Visible per-context monitoring indicator.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Indicator {
    pub active: bool,
    pub label: &'static str,
}

impl Indicator {
    fn from_active(active: bool) -> Self {
        Self {
            active,
            label: if active {
                "Monitoring: Active"
            } else {
                "Monitoring: Inactive"
            },
        }
    }
}

/// Routes requests between the control surface and page agents.
///
/// The indicator map is mutated only by `apply_state_change`, so the
/// panel's view always reflects pushed transitions rather than stale local
/// copies of the monitoring flag.
pub struct ContextRouter {
    agents: RwLock<HashMap<String, mpsc::UnboundedSender<Envelope>>>,
    indicators: RwLock<HashMap<String, bool>>,
}

impl ContextRouter {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            indicators: RwLock::new(HashMap::new()),
        }
    }

    /// Register a page agent's inbox under its context id.
    pub fn register_agent(&self, context_id: &str, sender: mpsc::UnboundedSender<Envelope>) {
        info!("Page agent registered: {}", context_id);
        self.agents.write().insert(context_id.to_string(), sender);
    }

    /// Remove a page agent on context teardown.
    pub fn unregister_agent(&self, context_id: &str) {
        if self.agents.write().remove(context_id).is_some() {
            info!("Page agent unregistered: {}", context_id);
        }
    }

    pub fn registered_contexts(&self) -> Vec<String> {
        self.agents.read().keys().cloned().collect()
    }

    /// Forward a request to the agent for `context_id` and await its single
    /// response. Routing problems come back as structured failures, never
    /// as panics or hung callers.
    pub async fn forward(&self, context_id: &str, request: AgentRequest) -> RouterResponse {
        let sender = match self.agents.read().get(context_id) {
            Some(sender) => sender.clone(),
            None => {
                return RouterResponse::failure(format!(
                    "no page context registered for '{}'",
                    context_id
                ));
            }
        };

        let (respond, rx) = oneshot::channel();
        if sender.send(Envelope { request, respond }).is_err() {
            return RouterResponse::failure(format!(
                "page context '{}' is no longer reachable",
                context_id
            ));
        }

        match rx.await {
            Ok(response) => response,
            Err(_) => RouterResponse::failure(format!(
                "page context '{}' disconnected before responding",
                context_id
            )),
        }
    }

    /// Reflect a pushed monitoring-state transition in the indicator.
    pub fn apply_state_change(&self, change: &StateChange) {
        debug!(
            "Monitoring state changed: {} -> {}",
            change.context_id, change.active
        );
        self.indicators
            .write()
            .insert(change.context_id.clone(), change.active);
    }

    /// Indicator for one context. Contexts never seen are inactive.
    pub fn indicator(&self, context_id: &str) -> Indicator {
        let active = self
            .indicators
            .read()
            .get(context_id)
            .copied()
            .unwrap_or(false);
        Indicator::from_active(active)
    }

    /// All known indicators, for the status surface.
    pub fn indicators(&self) -> HashMap<String, Indicator> {
        self.indicators
            .read()
            .iter()
            .map(|(id, active)| (id.clone(), Indicator::from_active(*active)))
            .collect()
    }

    /// Drain state-change notifications into the indicator map until the
    /// sending side closes.
    pub fn spawn_state_listener(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<StateChange>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(change) = rx.recv().await {
                self.apply_state_change(&change);
            }
        })
    }
}

impl Default for ContextRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_agent(response: RouterResponse) -> mpsc::UnboundedSender<Envelope> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                let _ = envelope.respond.send(response.clone());
            }
        });
        tx
    }

    #[tokio::test]
    async fn test_forward_to_registered_agent() {
        let router = ContextRouter::new();
        router.register_agent("ctx-1", stub_agent(RouterResponse::ok()));

        let response = router.forward("ctx-1", AgentRequest::StopMonitoring).await;
        assert!(response.success);
    }

    #[tokio::test]
    async fn test_forward_to_unknown_context_is_structured_failure() {
        let router = ContextRouter::new();
        let response = router.forward("nope", AgentRequest::StopMonitoring).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("no page context"));
    }

    #[tokio::test]
    async fn test_dropped_reply_channel_is_structured_failure() {
        let router = ContextRouter::new();
        // An agent that consumes requests without ever responding.
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        tokio::spawn(async move {
            while let Some(envelope) = rx.recv().await {
                drop(envelope.respond);
            }
        });
        router.register_agent("ctx-1", tx);

        let response = router.forward("ctx-1", AgentRequest::StopMonitoring).await;
        assert!(!response.success);
        assert!(response.error.unwrap().contains("disconnected"));
    }

    #[tokio::test]
    async fn test_unregistered_agent_is_unreachable() {
        let router = ContextRouter::new();
        router.register_agent("ctx-1", stub_agent(RouterResponse::ok()));
        router.unregister_agent("ctx-1");

        let response = router.forward("ctx-1", AgentRequest::StopMonitoring).await;
        assert!(!response.success);
    }

    #[test]
    fn test_indicator_follows_state_changes_only() {
        let router = ContextRouter::new();
        assert_eq!(router.indicator("ctx-1").label, "Monitoring: Inactive");

        router.apply_state_change(&StateChange {
            context_id: "ctx-1".into(),
            active: true,
        });
        let indicator = router.indicator("ctx-1");
        assert!(indicator.active);
        assert_eq!(indicator.label, "Monitoring: Active");

        router.apply_state_change(&StateChange {
            context_id: "ctx-1".into(),
            active: false,
        });
        assert!(!router.indicator("ctx-1").active);
    }

    #[tokio::test]
    async fn test_state_listener_drains_notifications() {
        let router = Arc::new(ContextRouter::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = router.clone().spawn_state_listener(rx);

        tx.send(StateChange {
            context_id: "ctx-9".into(),
            active: true,
        })
        .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert!(router.indicator("ctx-9").active);
    }
}
