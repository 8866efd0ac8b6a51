//! ReplyWire Core — error taxonomy, persisted settings, data paths.

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::{DataPaths, SelectorMethod, Settings};
