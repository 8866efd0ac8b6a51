//! Monitoring sessions — interval-driven poll/extract/relay/inject loops,
//! at most one per page context.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use replywire_extract::{extract, ScrapeResult, Selector};
use replywire_page::{inject, PageDriver};
use replywire_relay::{RelayPayload, RelayTransport};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::{ScrapeOutcome, SessionStatus, StateChange};

/// Everything a running poll loop shares with the registry.
struct SessionShared {
    context_id: String,
    endpoint: String,
    last_observed: Mutex<Option<String>>,
}

struct SessionHandle {
    task: JoinHandle<()>,
    shared: Arc<SessionShared>,
}

/// Owns every monitoring session. Starting a session for a context id that
/// already has one fully cancels the prior timer before arming the new one,
/// so two timers never fire concurrently for one context.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
    transport: Arc<dyn RelayTransport>,
    state_tx: mpsc::UnboundedSender<StateChange>,
}

impl SessionRegistry {
    pub fn new(
        transport: Arc<dyn RelayTransport>,
        state_tx: mpsc::UnboundedSender<StateChange>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            transport,
            state_tx,
        }
    }

    /// Start (or restart) monitoring for a page context.
    pub async fn start(
        &self,
        context_id: &str,
        driver: Arc<dyn PageDriver>,
        selectors: Vec<Selector>,
        endpoint: String,
        poll_interval: Duration,
        settle_delay: Duration,
    ) {
        // The prior loop must be fully dead before the replacement is
        // armed; a mid-tick task could otherwise relay against its own
        // dedup state while the new loop's first tick does the same.
        let prior = self.sessions.lock().remove(context_id);
        if let Some(prior) = prior {
            prior.task.abort();
            let _ = prior.task.await;
            info!("Superseded monitoring session for {}", context_id);
        }

        let shared = Arc::new(SessionShared {
            context_id: context_id.to_string(),
            endpoint,
            last_observed: Mutex::new(None),
        });

        let task = tokio::spawn(run_loop(
            shared.clone(),
            driver,
            selectors,
            self.transport.clone(),
            poll_interval,
            settle_delay,
        ));
        self.sessions
            .lock()
            .insert(context_id.to_string(), SessionHandle { task, shared });

        info!("Monitoring started for {}", context_id);
        let _ = self.state_tx.send(StateChange {
            context_id: context_id.to_string(),
            active: true,
        });
    }

    /// Stop monitoring for a page context. Idempotent: stopping a context
    /// with no session is a no-op.
    pub fn stop(&self, context_id: &str) {
        let removed = self.sessions.lock().remove(context_id);
        let Some(handle) = removed else {
            debug!("Stop for {} ignored: no active session", context_id);
            return;
        };
        handle.task.abort();
        info!("Monitoring stopped for {}", context_id);
        let _ = self.state_tx.send(StateChange {
            context_id: context_id.to_string(),
            active: false,
        });
    }

    pub fn is_active(&self, context_id: &str) -> bool {
        self.sessions.lock().contains_key(context_id)
    }

    /// Snapshot of every active session for the status surface.
    pub fn statuses(&self) -> Vec<SessionStatus> {
        self.sessions
            .lock()
            .values()
            .map(|handle| SessionStatus {
                context_id: handle.shared.context_id.clone(),
                endpoint: handle.shared.endpoint.clone(),
                active: true,
                last_observed_text: handle.shared.last_observed.lock().clone(),
            })
            .collect()
    }

    /// Relay an operator-selected snippet. Bypasses extraction and dedup
    /// entirely; the payload is tagged so the endpoint can tell it apart
    /// from monitored messages.
    pub async fn relay_selection(
        &self,
        text: &str,
        source: &str,
        endpoint: &str,
    ) -> replywire_core::Result<replywire_relay::RelayResponse> {
        let payload = RelayPayload::selection(text, source);
        self.transport.relay(&payload, endpoint).await
    }

    /// One extraction outside any session, relaying and injecting the same
    /// way the poll loop would. The control panel's manual scrape.
    pub async fn scrape_once(
        &self,
        driver: Arc<dyn PageDriver>,
        selectors: &[Selector],
        endpoint: &str,
        settle_delay: Duration,
    ) -> ScrapeOutcome {
        let html = match driver.html().await {
            Ok(html) => html,
            Err(e) => {
                return ScrapeOutcome {
                    result: ScrapeResult::miss(format!("page snapshot failed: {}", e)),
                    relayed: false,
                    relay_error: None,
                    injected: None,
                }
            }
        };
        let result = extract(&html, selectors);

        let mut outcome = ScrapeOutcome {
            result,
            relayed: false,
            relay_error: None,
            injected: None,
        };
        let Some(text) = outcome.result.text.clone() else {
            return outcome;
        };
        if endpoint.is_empty() {
            return outcome;
        }

        let payload = RelayPayload::new(text, outcome.result.auxiliary.clone(), driver.url());
        match self.transport.relay(&payload, endpoint).await {
            Ok(response) => {
                outcome.relayed = true;
                if let Some(reply) = response.reply.filter(|_| response.ok) {
                    let ok = inject(driver.as_ref(), &reply, settle_delay).await;
                    outcome.injected = Some(ok);
                }
            }
            Err(e) => outcome.relay_error = Some(e.to_string()),
        }
        outcome
    }
}

async fn run_loop(
    shared: Arc<SessionShared>,
    driver: Arc<dyn PageDriver>,
    selectors: Vec<Selector>,
    transport: Arc<dyn RelayTransport>,
    poll_interval: Duration,
    settle_delay: Duration,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        tick(&shared, &driver, &selectors, &transport, settle_delay).await;
    }
}

/// One poll tick: snapshot, extract, dedup, relay, inject.
async fn tick(
    shared: &Arc<SessionShared>,
    driver: &Arc<dyn PageDriver>,
    selectors: &[Selector],
    transport: &Arc<dyn RelayTransport>,
    settle_delay: Duration,
) {
    let html = match driver.html().await {
        Ok(html) => html,
        Err(e) => {
            warn!("Page snapshot failed for {}: {}", shared.context_id, e);
            return;
        }
    };

    let result = extract(&html, selectors);
    if !result.ok {
        debug!(
            "Extraction miss for {}: {}",
            shared.context_id,
            result.error.as_deref().unwrap_or("unknown")
        );
        return;
    }
    let Some(text) = result.text.filter(|t| !t.is_empty()) else {
        return;
    };

    {
        let mut last = shared.last_observed.lock();
        if last.as_deref() == Some(text.as_str()) {
            return;
        }
        // Advance before the relay is awaited: a slow or failed call must
        // not let a later tick re-relay the same text.
        *last = Some(text.clone());
    }

    info!("New message detected for {}", shared.context_id);
    if shared.endpoint.is_empty() {
        return;
    }

    let payload = RelayPayload::new(text, result.auxiliary, driver.url());
    let endpoint = shared.endpoint.clone();
    let context_id = shared.context_id.clone();
    let driver = driver.clone();
    let transport = transport.clone();

    // Fire and forget: a pending relay never delays the next extraction,
    // and an in-flight call is not cancelled if the session moves on.
    tokio::spawn(async move {
        match transport.relay(&payload, &endpoint).await {
            Ok(response) => {
                if let Some(reply) = response.reply.filter(|_| response.ok) {
                    let ok = inject(driver.as_ref(), &reply, settle_delay).await;
                    if !ok {
                        warn!("Reply injection failed for {}", context_id);
                    }
                }
            }
            // Lossy on failure: the text was already marked observed, so
            // the message is dropped rather than retried.
            Err(e) => warn!("Relay failed for {}: {}", context_id, e),
        }
    });
}
