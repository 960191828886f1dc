//! Executor error types.

use thiserror::Error;

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Errors surfaced by an executor client call as a whole.
///
/// Per-container allocation failures are not errors; they come back as
/// [`AllocationFailure`](crate::AllocationFailure) records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("executor unavailable: {0}")]
    Unavailable(String),

    #[error("executor request failed: {0}")]
    Request(String),
}
