//! Relay — serializes extracted text and performs the single-attempt call
//! to the operator-configured endpoint.

pub mod client;
pub mod types;

pub use client::{RelayClient, RelayTransport};
pub use types::{RelayPayload, RelayResponse};
