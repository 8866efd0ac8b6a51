//! Relay wire types — matching the operator endpoint's JSON contract.

use serde::{Deserialize, Serialize};

/// Outbound request body. Constructed immediately before each call so the
/// timestamp reflects send time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayPayload {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auxiliary: Option<String>,
    /// URL of the page the text was extracted from.
    pub source: String,
    /// ISO-8601 UTC timestamp.
    pub timestamp: String,
    /// Origin of the relay, when it isn't the monitoring loop
    /// (e.g. `"context_menu_selection"` for an operator-selected snippet).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

impl RelayPayload {
    pub fn new(text: impl Into<String>, auxiliary: Option<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            auxiliary,
            source: source.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            method: None,
        }
    }

    /// Payload for an operator-selected snippet (context-menu relay).
    pub fn selection(text: impl Into<String>, source: impl Into<String>) -> Self {
        let mut payload = Self::new(text, None, source);
        payload.method = Some("context_menu_selection".into());
        payload
    }
}

/// Parsed endpoint response. Extra fields are kept in `raw` untouched.
#[derive(Debug, Clone)]
pub struct RelayResponse {
    pub ok: bool,
    pub reply: Option<String>,
    pub raw: serde_json::Value,
}

impl RelayResponse {
    /// Interpret a 2xx response body. A missing `success` field counts as
    /// success; a missing or empty `reply` means "no auto-reply".
    pub fn from_body(raw: serde_json::Value) -> Self {
        let ok = raw.get("success").and_then(|v| v.as_bool()).unwrap_or(true);
        let reply = raw
            .get("reply")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        Self { ok, reply, raw }
    }

    /// True when the endpoint produced a reply that should be injected.
    pub fn has_reply(&self) -> bool {
        self.ok && self.reply.is_some()
    }
}
