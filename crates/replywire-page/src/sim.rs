//! In-memory page — a scriptable `PageDriver` for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use replywire_core::{Error, Result};
use scraper::{Html, Selector as CssSelector};

use crate::driver::{PageDriver, PageEvent};

#[derive(Default)]
struct SimState {
    html: String,
    values: HashMap<String, String>,
    events: Vec<(String, PageEvent)>,
    clicks: Vec<String>,
    disabled_cleared: Vec<String>,
    fail_next_click: bool,
}

/// A page whose document can be swapped between poll ticks, recording every
/// interaction the injector performs.
pub struct SimPage {
    url: String,
    state: Mutex<SimState>,
}

impl SimPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: Mutex::new(SimState {
                html: html.into(),
                ..Default::default()
            }),
        }
    }

    /// Replace the document, simulating externally-driven page changes.
    pub fn set_html(&self, html: impl Into<String>) {
        self.state.lock().html = html.into();
    }

    /// Make the next click return a driver fault.
    pub fn fail_next_click(&self) {
        self.state.lock().fail_next_click = true;
    }

    pub fn value_of(&self, selector: &str) -> Option<String> {
        self.state.lock().values.get(selector).cloned()
    }

    pub fn events_for(&self, selector: &str) -> Vec<&'static str> {
        self.state
            .lock()
            .events
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, e)| e.name())
            .collect()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn disabled_cleared(&self) -> Vec<String> {
        self.state.lock().disabled_cleared.clone()
    }

    fn matches(&self, selector: &str) -> Result<bool> {
        let parsed = CssSelector::parse(selector)
            .map_err(|e| Error::Driver(format!("invalid selector '{}': {}", selector, e)))?;
        let state = self.state.lock();
        let doc = Html::parse_document(&state.html);
        Ok(doc.select(&parsed).next().is_some())
    }

    fn require(&self, selector: &str) -> Result<()> {
        if self.matches(selector)? {
            Ok(())
        } else {
            Err(Error::Driver(format!("no element matches '{}'", selector)))
        }
    }
}

#[async_trait]
impl PageDriver for SimPage {
    fn url(&self) -> String {
        self.url.clone()
    }

    async fn html(&self) -> Result<String> {
        Ok(self.state.lock().html.clone())
    }

    async fn exists(&self, selector: &str) -> Result<bool> {
        self.matches(selector)
    }

    async fn set_value(&self, selector: &str, value: &str) -> Result<()> {
        self.require(selector)?;
        self.state
            .lock()
            .values
            .insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn dispatch(&self, selector: &str, event: PageEvent) -> Result<()> {
        self.require(selector)?;
        self.state.lock().events.push((selector.to_string(), event));
        Ok(())
    }

    async fn clear_disabled(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.state
            .lock()
            .disabled_cleared
            .push(selector.to_string());
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        let mut state = self.state.lock();
        if state.fail_next_click {
            state.fail_next_click = false;
            return Err(Error::Driver(format!("click on '{}' failed", selector)));
        }
        state.clicks.push(selector.to_string());
        Ok(())
    }
}
