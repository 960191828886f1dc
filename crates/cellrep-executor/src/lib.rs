//! cellrep-executor — the boundary between the cell rep and the container
//! runtime.
//!
//! The rep never manages containers itself. It reads the runtime's
//! inventory and capacity and submits batch allocation requests through
//! [`ExecutorClient`]. Capacity accounting and container lifecycle stay on
//! the other side of this trait.
//!
//! Enable the `fake` feature for [`fake::FakeExecutorClient`], a
//! deterministic in-memory client with canned responses per operation.

pub mod client;
pub mod error;
#[cfg(feature = "fake")]
pub mod fake;
pub mod types;

pub use client::{ExecutorClient, ExecutorFuture};
pub use error::{ExecutorError, ExecutorResult};
pub use types::*;
