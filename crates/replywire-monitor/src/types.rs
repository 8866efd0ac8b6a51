//! Monitoring state types shared with the router and the control surface.

use serde::Serialize;

/// Pushed to the router whenever a session starts or stops, so dependent
/// contexts never read stale local copies of the monitoring flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub context_id: String,
    pub active: bool,
}

/// Snapshot of one session for the status surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub context_id: String,
    pub endpoint: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_observed_text: Option<String>,
}

/// Result of a one-off scrape, including what happened downstream of the
/// extraction when an endpoint was configured.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub result: replywire_extract::ScrapeResult,
    pub relayed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_error: Option<String>,
    /// Whether a returned reply was successfully submitted; absent when the
    /// endpoint produced no reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected: Option<bool>,
}
