//! Persisted monitoring settings — the durable source of truth that survives
//! page reloads and controller restarts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How the operator addresses elements on the monitored page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorMethod {
    #[serde(rename = "css")]
    Css,
    #[serde(rename = "path-query")]
    PathQuery,
    #[serde(rename = "custom")]
    Custom,
}

impl SelectorMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::PathQuery => "path-query",
            Self::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "css" => Some(Self::Css),
            "path-query" => Some(Self::PathQuery),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Persisted monitoring configuration.
///
/// Field names mirror the control panel's storage keys. Read at context
/// startup, written on every settings change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_method")]
    pub selector_method: SelectorMethod,
    #[serde(default = "default_selector")]
    pub selector: String,
    #[serde(default = "default_custom_selectors")]
    pub custom_selectors: Vec<String>,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub is_monitoring: bool,
    /// Poll cadence for monitoring sessions, in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Delay between enabling the submit control and clicking it. A
    /// heuristic to let the page's own event handling settle, not a
    /// delivery guarantee.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
    /// Path to the settings file (not serialized).
    #[serde(skip)]
    pub settings_path: PathBuf,
}

fn default_method() -> SelectorMethod {
    SelectorMethod::Css
}
fn default_selector() -> String {
    ".message, .text-message, .sms-message".into()
}
fn default_custom_selectors() -> Vec<String> {
    vec![".message".into(), ".text-message".into(), ".message-body".into()]
}
fn default_poll_interval() -> u64 {
    1000
}
fn default_settle_delay() -> u64 {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selector_method: default_method(),
            selector: default_selector(),
            custom_selectors: default_custom_selectors(),
            endpoint: String::new(),
            is_monitoring: false,
            poll_interval_ms: default_poll_interval(),
            settle_delay_ms: default_settle_delay(),
            settings_path: PathBuf::new(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file in the data directory, or seed defaults.
    pub fn load(data_dir: &Path) -> Self {
        let settings_path = data_dir.join("settings.json");
        let mut settings = match std::fs::read_to_string(&settings_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("Settings file unreadable, using defaults: {}", e);
                Settings::default()
            }),
            Err(_) => Settings::default(),
        };
        settings.settings_path = settings_path;
        settings
    }

    /// Save settings to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(&self.settings_path, json)
    }

    /// Apply a partial update from the control panel. Unknown fields are
    /// ignored. Returns true if anything changed.
    pub fn apply_updates(&mut self, updates: &serde_json::Value) -> bool {
        let mut changed = false;
        if let Some(method) = updates
            .get("selectorMethod")
            .and_then(|v| v.as_str())
            .and_then(SelectorMethod::from_name)
        {
            changed |= self.selector_method != method;
            self.selector_method = method;
        }
        if let Some(selector) = updates.get("selector").and_then(|v| v.as_str()) {
            changed |= self.selector != selector;
            self.selector = selector.to_string();
        }
        if let Some(list) = updates.get("customSelectors").and_then(|v| v.as_array()) {
            let parsed: Vec<String> = list
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            changed |= self.custom_selectors != parsed;
            self.custom_selectors = parsed;
        }
        if let Some(endpoint) = updates.get("endpoint").and_then(|v| v.as_str()) {
            changed |= self.endpoint != endpoint;
            self.endpoint = endpoint.trim().to_string();
        }
        if let Some(monitoring) = updates.get("isMonitoring").and_then(|v| v.as_bool()) {
            changed |= self.is_monitoring != monitoring;
            self.is_monitoring = monitoring;
        }
        if let Some(interval) = updates.get("pollIntervalMs").and_then(|v| v.as_u64()) {
            let interval = interval.max(100);
            changed |= self.poll_interval_ms != interval;
            self.poll_interval_ms = interval;
        }
        if let Some(delay) = updates.get("settleDelayMs").and_then(|v| v.as_u64()) {
            changed |= self.settle_delay_ms != delay;
            self.settle_delay_ms = delay;
        }
        changed
    }

    /// The raw selector expressions the current method resolves to, paired
    /// with the method each should be evaluated as. Custom entries are
    /// always CSS.
    pub fn effective_expressions(&self) -> Vec<(SelectorMethod, String)> {
        match self.selector_method {
            SelectorMethod::Custom => self
                .custom_selectors
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| (SelectorMethod::Css, s.to_string()))
                .collect(),
            method => {
                let expr = self.selector.trim();
                if expr.is_empty() {
                    Vec::new()
                } else {
                    vec![(method, expr.to_string())]
                }
            }
        }
    }
}

/// Paths to ReplyWire data files.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Persisted settings (`data/settings.json`).
    pub settings_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates it if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            settings_file: root.join("settings.json"),
            root,
        })
    }
}
