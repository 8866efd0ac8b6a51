//! Monitoring — the interval-driven change-detection loop that turns page
//! snapshots into relay calls and injected replies.

pub mod session;
pub mod types;

pub use session::SessionRegistry;
pub use types::{ScrapeOutcome, SessionStatus, StateChange};
