//! Context routing — typed request/response messages between the control
//! surface, the persistent controller, and per-page agents, plus the
//! monitoring indicator those contexts share.

pub mod actions;
pub mod agent;
pub mod router;

pub use actions::{AgentRequest, Envelope, RouterResponse};
pub use agent::PageAgent;
pub use router::{ContextRouter, Indicator};
