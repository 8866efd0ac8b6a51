//! Text extraction — selector model, path-query evaluation, and the
//! snapshot-based extraction engine.
//!
//! Every call parses a fresh snapshot of the page HTML, so results reflect
//! the tree at call time and never update live.

pub mod engine;
pub mod path;
pub mod types;

pub use engine::extract;
pub use types::{ScrapeResult, Selector, SelectorKind};
