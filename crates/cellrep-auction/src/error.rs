//! Auction participant error types.

use cellrep_executor::ExecutorError;
use thiserror::Error;

/// Errors that abort a whole `state` / `perform` / `reset` call.
///
/// Per-item problems (bad tags, unresolvable rootfs, refused allocations)
/// never surface here; they shrink the result instead.
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("not-a-simulation-rep")]
    NotASimulation,
}

pub type AuctionResult<T> = Result<T, AuctionError>;

/// Instance guid generation failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to generate instance guid: {0}")]
pub struct GuidError(pub String);

/// Why a single work item could not become an allocation request.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    InstanceGuid(#[from] GuidError),

    #[error(transparent)]
    RootFs(#[from] cellrep_core::RootFsError),
}
