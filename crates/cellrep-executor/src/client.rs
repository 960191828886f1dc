//! The capability set the cell rep consumes from the runtime.

use std::future::Future;
use std::pin::Pin;

use crate::error::ExecutorResult;
use crate::types::{AllocationFailure, AllocationRequest, Container, ExecutorResources};

/// Boxed future returned by executor client calls.
pub type ExecutorFuture<'a, T> = Pin<Box<dyn Future<Output = ExecutorResult<T>> + Send + 'a>>;

/// Narrow view of the container runtime.
///
/// Every call is a single round trip with no retries; implementations own
/// their timeouts. The runtime may change between any two calls.
pub trait ExecutorClient: Send + Sync {
    /// All containers the runtime currently tracks, in any state.
    fn list_containers(&self) -> ExecutorFuture<'_, Vec<Container>>;

    /// Capacity of the cell.
    fn total_resources(&self) -> ExecutorFuture<'_, ExecutorResources>;

    /// Capacity not yet reserved by any container.
    fn remaining_resources(&self) -> ExecutorFuture<'_, ExecutorResources>;

    /// Volume drivers installed on the cell.
    fn volume_drivers(&self) -> ExecutorFuture<'_, Vec<String>>;

    /// Runtime health probe. Never errors; an unreachable runtime is unhealthy.
    fn healthy(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Reserve containers for a batch of requests.
    ///
    /// `Ok` carries the requests that could not be reserved; every request
    /// not listed was accepted. `Err` means no request can be assumed
    /// received.
    fn allocate_containers(
        &self,
        requests: Vec<AllocationRequest>,
    ) -> ExecutorFuture<'_, Vec<AllocationFailure>>;
}
