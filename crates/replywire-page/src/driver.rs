//! The seam between ReplyWire and a live page context.

use async_trait::async_trait;
use replywire_core::Result;

/// Synthetic events dispatched on page controls. Reactive front ends only
/// notice value writes when the matching notification event follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Input,
    Change,
    MouseOver,
    MouseDown,
    MouseUp,
}

impl PageEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
            Self::MouseOver => "mouseover",
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
        }
    }
}

/// One live, addressable page instance. All selectors are CSS and operate
/// on the first match.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// URL of the page this driver controls.
    fn url(&self) -> String;

    /// Snapshot of the current document HTML.
    async fn html(&self) -> Result<String>;

    /// True if any element matches the selector.
    async fn exists(&self, selector: &str) -> Result<bool>;

    /// Set the value of the first matching input control.
    async fn set_value(&self, selector: &str, value: &str) -> Result<()>;

    /// Dispatch a synthetic event on the first match.
    async fn dispatch(&self, selector: &str, event: PageEvent) -> Result<()>;

    /// Clear the disabled attribute and property on the first match.
    async fn clear_disabled(&self, selector: &str) -> Result<()>;

    /// Click the first match.
    async fn click(&self, selector: &str) -> Result<()>;
}
