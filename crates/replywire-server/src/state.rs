//! Shared application state.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use replywire_core::{DataPaths, Settings};
use replywire_extract::Selector;
use replywire_monitor::SessionRegistry;
use replywire_page::{PageDriver, SimPage};
use replywire_relay::{RelayClient, RelayTransport};
use replywire_router::{ContextRouter, PageAgent};
use tokio::sync::mpsc;
use tracing::info;

/// Shared state accessible from all route handlers.
///
/// The controller owns the configuration store, the router, and the session
/// registry; page contexts come and go as agents register.
pub struct AppState {
    pub data_paths: DataPaths,
    pub settings: RwLock<Settings>,
    pub router: Arc<ContextRouter>,
    pub sessions: Arc<SessionRegistry>,
    /// Hosted in-memory page contexts, addressable by context id.
    pub pages: RwLock<HashMap<String, Arc<SimPage>>>,
}

impl AppState {
    /// Build state with the production relay client.
    pub fn new(data_dir: &Path) -> std::io::Result<Self> {
        Self::with_transport(data_dir, Arc::new(RelayClient::new()))
    }

    /// Build state with an explicit relay transport (tests swap this out).
    pub fn with_transport(
        data_dir: &Path,
        transport: Arc<dyn RelayTransport>,
    ) -> std::io::Result<Self> {
        let data_paths = DataPaths::new(data_dir)?;
        let settings = Settings::load(&data_paths.root);
        info!(
            "Settings loaded: method={}, monitoring={}",
            settings.selector_method.name(),
            settings.is_monitoring
        );

        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let sessions = Arc::new(SessionRegistry::new(transport, state_tx));
        let router = Arc::new(ContextRouter::new());
        router.clone().spawn_state_listener(state_rx);

        Ok(Self {
            data_paths,
            settings: RwLock::new(settings),
            router,
            sessions,
            pages: RwLock::new(HashMap::new()),
        })
    }

    /// Host a new in-memory page context and register its agent with the
    /// router. Returns false if the context id is already taken.
    pub fn register_page(&self, context_id: &str, url: &str, html: &str) -> bool {
        let page = Arc::new(SimPage::new(url, html));
        {
            let mut pages = self.pages.write();
            if pages.contains_key(context_id) {
                return false;
            }
            pages.insert(context_id.to_string(), page.clone());
        }

        let (poll_interval, settle_delay) = {
            let settings = self.settings.read();
            (
                Duration::from_millis(settings.poll_interval_ms),
                Duration::from_millis(settings.settle_delay_ms),
            )
        };
        let agent = PageAgent::new(
            context_id,
            page as Arc<dyn PageDriver>,
            self.sessions.clone(),
            poll_interval,
            settle_delay,
        );
        self.router.register_agent(context_id, agent.spawn());
        true
    }

    /// Tear down a hosted page context. The agent loop ends when its inbox
    /// is dropped, which also stops any running session.
    pub fn remove_page(&self, context_id: &str) -> bool {
        let removed = self.pages.write().remove(context_id).is_some();
        if removed {
            self.router.unregister_agent(context_id);
        }
        removed
    }

    /// Ordered selector list resolved from the persisted settings.
    pub fn effective_selectors(&self) -> Vec<Selector> {
        Selector::from_settings(&self.settings.read())
    }

    pub fn endpoint(&self) -> String {
        self.settings.read().endpoint.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use replywire_relay::{RelayPayload, RelayResponse};
    use replywire_router::AgentRequest;
    use tokio::time::{sleep, Duration};

    /// Records every relayed text; replies "on my way" to "bye" only.
    struct RecordingTransport {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
            })
        }

        fn texts(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl RelayTransport for RecordingTransport {
        async fn relay(
            &self,
            payload: &RelayPayload,
            _endpoint: &str,
        ) -> replywire_core::Result<RelayResponse> {
            self.calls.lock().push(payload.text.clone());
            let raw = if payload.text == "bye" {
                serde_json::json!({ "success": true, "reply": "on my way" })
            } else {
                serde_json::json!({ "success": true })
            };
            Ok(RelayResponse::from_body(raw))
        }
    }

    fn page_html(messages: &[&str]) -> String {
        let mut html = String::from("<html><body><div id=\"thread\">");
        for m in messages {
            html.push_str("<div class=\"message\">");
            html.push_str(m);
            html.push_str("</div>");
        }
        html.push_str(
            "</div><textarea class=\"message-input\"></textarea>\
             <button aria-label=\"Send message\">Send</button></body></html>",
        );
        html
    }

    fn build_state(transport: Arc<dyn RelayTransport>) -> (Arc<AppState>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_transport(dir.path(), transport).unwrap();
        state.settings.write().endpoint = "https://replies.example/api".into();
        (Arc::new(state), dir)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_pipeline_relays_and_injects() {
        let transport = RecordingTransport::new();
        let (state, _dir) = build_state(transport.clone());

        assert!(state.register_page("tab-1", "https://m.example/chat", &page_html(&["hi"])));

        let response = state
            .router
            .forward(
                "tab-1",
                AgentRequest::StartMonitoring {
                    selectors: state.effective_selectors(),
                    endpoint: state.endpoint(),
                },
            )
            .await;
        assert!(response.success, "start failed: {:?}", response.error);
        assert!(state.sessions.is_active("tab-1"));

        // First tick relays the current newest message.
        sleep(Duration::from_millis(1510)).await;
        assert_eq!(transport.texts(), vec!["hi"]);

        // A new inbound message shows up; its relay returns an auto-reply
        // that lands in the composer and gets sent.
        let page = state.pages.read().get("tab-1").cloned().unwrap();
        page.set_html(page_html(&["hi", "bye"]));
        sleep(Duration::from_millis(2600)).await;

        assert_eq!(transport.texts(), vec!["hi", "bye"]);
        assert_eq!(
            page.value_of("textarea.message-input").as_deref(),
            Some("on my way")
        );
        assert_eq!(
            page.clicks(),
            vec![r#"button[aria-label="Send message"]"#.to_string()]
        );
        assert!(state.router.indicator("tab-1").active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_polling_and_clears_indicator() {
        let transport = RecordingTransport::new();
        let (state, _dir) = build_state(transport.clone());

        assert!(state.register_page("tab-1", "https://m.example/chat", &page_html(&["hi"])));
        state
            .router
            .forward(
                "tab-1",
                AgentRequest::StartMonitoring {
                    selectors: state.effective_selectors(),
                    endpoint: state.endpoint(),
                },
            )
            .await;
        sleep(Duration::from_millis(1510)).await;

        let response = state
            .router
            .forward("tab-1", AgentRequest::StopMonitoring)
            .await;
        assert!(response.success);
        sleep(Duration::from_millis(50)).await;
        assert!(!state.router.indicator("tab-1").active);

        let page = state.pages.read().get("tab-1").cloned().unwrap();
        page.set_html(page_html(&["hi", "bye"]));
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(transport.texts(), vec!["hi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_page_stops_its_session() {
        let transport = RecordingTransport::new();
        let (state, _dir) = build_state(transport.clone());

        assert!(state.register_page("tab-1", "https://m.example/chat", &page_html(&["hi"])));
        state
            .router
            .forward(
                "tab-1",
                AgentRequest::StartMonitoring {
                    selectors: state.effective_selectors(),
                    endpoint: state.endpoint(),
                },
            )
            .await;
        sleep(Duration::from_millis(1510)).await;
        assert!(state.sessions.is_active("tab-1"));

        assert!(state.remove_page("tab-1"));
        sleep(Duration::from_millis(50)).await;
        assert!(!state.sessions.is_active("tab-1"));
        assert!(!state.remove_page("tab-1"));
    }

    #[tokio::test]
    async fn test_duplicate_context_id_rejected() {
        let transport = RecordingTransport::new();
        let (state, _dir) = build_state(transport);

        assert!(state.register_page("tab-1", "https://m.example/a", "<p></p>"));
        assert!(!state.register_page("tab-1", "https://m.example/b", "<p></p>"));
    }
}
