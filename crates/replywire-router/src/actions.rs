//! Typed inter-context messages — the `{action: ...}` wire protocol.

use replywire_extract::Selector;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// A request routed to one page agent. The `action` tag matches what the
/// control panel sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum AgentRequest {
    #[serde(rename_all = "camelCase")]
    StartMonitoring {
        selectors: Vec<Selector>,
        endpoint: String,
    },
    StopMonitoring,
    #[serde(rename_all = "camelCase")]
    ScrapeOnce {
        selectors: Vec<Selector>,
        endpoint: String,
    },
    #[serde(rename_all = "camelCase")]
    RelayReplyToPage { text: String },
}

/// Structured acknowledgment for a routed request. Extra response fields
/// ride in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub data: serde_json::Value,
}

impl RouterResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            data: serde_json::json!({}),
        }
    }

    pub fn ok_with(data: serde_json::Value) -> Self {
        Self {
            success: true,
            error: None,
            data,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            data: serde_json::json!({}),
        }
    }
}

/// A request paired with its reply channel. Every envelope is answered
/// exactly once; a dropped sender surfaces as a routing failure to the
/// caller instead of a hung callback.
pub struct Envelope {
    pub request: AgentRequest,
    pub respond: oneshot::Sender<RouterResponse>,
}
