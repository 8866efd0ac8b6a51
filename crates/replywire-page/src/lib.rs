//! Page interaction — the driver seam over a live page context, the reply
//! injector, and an in-memory page for tests and local runs.

pub mod driver;
pub mod injector;
pub mod sim;

pub use driver::{PageDriver, PageEvent};
pub use injector::inject;
pub use sim::SimPage;
