//! In-memory executor client with canned responses.
//!
//! Every operation returns whatever was last configured for it and records
//! that it was called. Allocation batches are recorded in full so tests can
//! assert on exactly what reached the runtime.

use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::{ExecutorClient, ExecutorFuture};
use crate::error::{ExecutorError, ExecutorResult};
use crate::types::{AllocationFailure, AllocationRequest, Container, ExecutorResources};

/// Decides the outcome of one `allocate_containers` call.
pub type AllocateStub =
    Arc<dyn Fn(&[AllocationRequest]) -> ExecutorResult<Vec<AllocationFailure>> + Send + Sync>;

struct FakeState {
    containers: ExecutorResult<Vec<Container>>,
    total_resources: ExecutorResult<ExecutorResources>,
    remaining_resources: ExecutorResult<ExecutorResources>,
    volume_drivers: ExecutorResult<Vec<String>>,
    healthy: bool,
    allocate: Option<AllocateStub>,
    allocate_calls: Vec<Vec<AllocationRequest>>,
    list_containers_calls: usize,
    healthy_calls: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            containers: Ok(Vec::new()),
            total_resources: Ok(ExecutorResources::default()),
            remaining_resources: Ok(ExecutorResources::default()),
            volume_drivers: Ok(Vec::new()),
            healthy: true,
            allocate: None,
            allocate_calls: Vec::new(),
            list_containers_calls: 0,
            healthy_calls: 0,
        }
    }
}

/// Deterministic [`ExecutorClient`] for tests.
///
/// Defaults: no containers, zero resources, no volume drivers, healthy,
/// and every allocation succeeds.
#[derive(Clone, Default)]
pub struct FakeExecutorClient {
    state: Arc<Mutex<FakeState>>,
}

impl FakeExecutorClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test thread poisons the lock; the data is still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_containers(&self, containers: Vec<Container>) {
        self.lock().containers = Ok(containers);
    }

    /// Current inventory; empty while listing is set to fail.
    pub fn containers(&self) -> Vec<Container> {
        self.lock().containers.clone().unwrap_or_default()
    }

    pub fn fail_list_containers(&self, error: ExecutorError) {
        self.lock().containers = Err(error);
    }

    pub fn set_total_resources(&self, resources: ExecutorResources) {
        self.lock().total_resources = Ok(resources);
    }

    pub fn fail_total_resources(&self, error: ExecutorError) {
        self.lock().total_resources = Err(error);
    }

    pub fn set_remaining_resources(&self, resources: ExecutorResources) {
        self.lock().remaining_resources = Ok(resources);
    }

    pub fn fail_remaining_resources(&self, error: ExecutorError) {
        self.lock().remaining_resources = Err(error);
    }

    pub fn set_volume_drivers(&self, drivers: Vec<String>) {
        self.lock().volume_drivers = Ok(drivers);
    }

    pub fn fail_volume_drivers(&self, error: ExecutorError) {
        self.lock().volume_drivers = Err(error);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.lock().healthy = healthy;
    }

    /// Replace the allocation behaviour.
    pub fn on_allocate(&self, stub: AllocateStub) {
        self.lock().allocate = Some(stub);
    }

    /// Reject the listed container guids; accept everything else.
    pub fn reject_allocations<I, S>(&self, guids: I, reason: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rejected: BTreeSet<String> = guids.into_iter().map(Into::into).collect();
        let reason = reason.to_string();
        self.on_allocate(Arc::new(
            move |requests: &[AllocationRequest]| -> ExecutorResult<Vec<AllocationFailure>> {
                Ok(requests
                    .iter()
                    .filter(|r| rejected.contains(&r.guid))
                    .map(|r| AllocationFailure::new(r.clone(), reason.clone()))
                    .collect())
            },
        ));
    }

    /// Fail every allocation call outright.
    pub fn fail_allocate(&self, error: ExecutorError) {
        self.on_allocate(Arc::new(
            move |_: &[AllocationRequest]| -> ExecutorResult<Vec<AllocationFailure>> {
                Err(error.clone())
            },
        ));
    }

    /// Every batch passed to `allocate_containers`, in call order.
    pub fn allocate_calls(&self) -> Vec<Vec<AllocationRequest>> {
        self.lock().allocate_calls.clone()
    }

    pub fn allocate_call_count(&self) -> usize {
        self.lock().allocate_calls.len()
    }

    pub fn list_containers_call_count(&self) -> usize {
        self.lock().list_containers_calls
    }

    pub fn healthy_call_count(&self) -> usize {
        self.lock().healthy_calls
    }
}

impl ExecutorClient for FakeExecutorClient {
    fn list_containers(&self) -> ExecutorFuture<'_, Vec<Container>> {
        let result = {
            let mut state = self.lock();
            state.list_containers_calls += 1;
            state.containers.clone()
        };
        Box::pin(async move { result })
    }

    fn total_resources(&self) -> ExecutorFuture<'_, ExecutorResources> {
        let result = self.lock().total_resources.clone();
        Box::pin(async move { result })
    }

    fn remaining_resources(&self) -> ExecutorFuture<'_, ExecutorResources> {
        let result = self.lock().remaining_resources.clone();
        Box::pin(async move { result })
    }

    fn volume_drivers(&self) -> ExecutorFuture<'_, Vec<String>> {
        let result = self.lock().volume_drivers.clone();
        Box::pin(async move { result })
    }

    fn healthy(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let healthy = {
            let mut state = self.lock();
            state.healthy_calls += 1;
            state.healthy
        };
        Box::pin(async move { healthy })
    }

    fn allocate_containers(
        &self,
        requests: Vec<AllocationRequest>,
    ) -> ExecutorFuture<'_, Vec<AllocationFailure>> {
        let stub = {
            let mut state = self.lock();
            state.allocate_calls.push(requests.clone());
            state.allocate.clone()
        };
        let result = match stub {
            Some(stub) => stub(&requests),
            None => Ok(Vec::new()),
        };
        Box::pin(async move { result })
    }
}
