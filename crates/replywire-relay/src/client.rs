//! Relay client — one POST per detected message, no retry.

use async_trait::async_trait;
use replywire_core::{Error, Result};
use tracing::debug;

use crate::types::{RelayPayload, RelayResponse};

/// How much of a failing response body to carry into the error message.
const BODY_EXCERPT_LEN: usize = 200;

/// Seam between the monitoring loop and the network. Lets tests count relay
/// calls and simulate failures without a live endpoint.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn relay(&self, payload: &RelayPayload, endpoint: &str) -> Result<RelayResponse>;
}

/// HTTP relay client for the operator-configured endpoint.
///
/// Built without a cookie provider: the endpoint is an external service
/// chosen by the operator, and page-context credentials must never be
/// correlated with it.
pub struct RelayClient {
    client: reqwest::Client,
}

impl RelayClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    async fn send(&self, payload: &RelayPayload, endpoint: &str) -> Result<RelayResponse> {
        debug!("Relaying {} chars to {}", payload.text.len(), endpoint);

        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Relay(format!("request to {} failed: {}", endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Relay(format!(
                "endpoint returned {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Relay(format!("malformed response body: {}", e)))?;

        Ok(RelayResponse::from_body(raw))
    }
}

impl Default for RelayClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RelayTransport for RelayClient {
    async fn relay(&self, payload: &RelayPayload, endpoint: &str) -> Result<RelayResponse> {
        self.send(payload, endpoint).await
    }
}

fn excerpt(body: &str) -> &str {
    let end = body
        .char_indices()
        .nth(BODY_EXCERPT_LEN)
        .map(|(i, _)| i)
        .unwrap_or(body.len());
    body[..end].trim_end()
}
