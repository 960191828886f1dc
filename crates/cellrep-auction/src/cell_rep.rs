//! Auction cell rep — the cell's side of the auction.
//!
//! The auctioneer asks every cell for a [`CellState`] snapshot, places work
//! against those snapshots, and hands each winning cell a [`Work`] batch.
//! Snapshots are stale by the time they are used, so every allocation in
//! `perform` may still be refused; refused work goes back to the auctioneer
//! to be placed elsewhere.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{error, info, warn};

use cellrep_core::tags::{DOMAIN_TAG, LIFECYCLE_TAG, LRP_LIFECYCLE, TASK_LIFECYCLE};
use cellrep_core::{
    CellState, ConfigError, Lrp, RepConfig, RootFsProviders, Task, Work,
    actual_lrp_instance_key_from_tags, actual_lrp_key_from_tags,
};
use cellrep_executor::{Container, ExecutorClient};

use crate::allocator::{ContainerAllocator, InstanceGuidGenerator, uuid_instance_guid_generator};
use crate::convert::{
    cell_resources, container_placement_constraint, container_resource, lrp_requested_memory_mb,
};
use crate::error::{AuctionError, AuctionResult};
use crate::evacuation::EvacuationReporter;

/// Boxed future returned by [`AuctionCellClient`] calls.
pub type AuctionFuture<'a, T> = Pin<Box<dyn Future<Output = AuctionResult<T>> + Send + 'a>>;

/// What the auctioneer can ask of a cell.
pub trait AuctionCellClient: Send + Sync {
    /// Snapshot of the cell plus the runtime health probe result.
    fn state(&self) -> AuctionFuture<'_, (CellState, bool)>;

    /// Start `work`; returns the subset that could not be started.
    fn perform(&self, work: Work) -> AuctionFuture<'_, Work>;

    /// Only meaningful for simulated cells.
    fn reset(&self) -> AuctionResult<()>;
}

/// Auction participant backed by a real executor.
pub struct AuctionCellRep {
    cell_id: String,
    zone: String,
    root_fs_providers: RootFsProviders,
    placement_tags: Vec<String>,
    optional_placement_tags: Vec<String>,
    proxy_memory_mb: Option<i32>,
    client: Arc<dyn ExecutorClient>,
    evacuation_reporter: Arc<dyn EvacuationReporter>,
    allocator: ContainerAllocator,
}

impl AuctionCellRep {
    /// Build a rep from validated configuration. Instance guids are random
    /// UUIDs unless replaced with [`Self::with_instance_guid_generator`].
    pub fn new(
        config: &RepConfig,
        client: Arc<dyn ExecutorClient>,
        evacuation_reporter: Arc<dyn EvacuationReporter>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let stack_path_map = config.stack_path_map()?;
        let root_fs_providers =
            RootFsProviders::new(&stack_path_map, config.supported_providers.iter().cloned());

        let proxy_memory_mb = config
            .enable_container_proxy
            .then_some(config.proxy_memory_allocation_mb);

        let mut allocator =
            ContainerAllocator::new(client.clone(), stack_path_map, uuid_instance_guid_generator());
        if let Some(proxy) = proxy_memory_mb {
            allocator = allocator.with_container_proxy(proxy);
        }

        Ok(Self {
            cell_id: config.cell_id.clone(),
            zone: config.zone.clone(),
            root_fs_providers,
            placement_tags: config.placement_tags.clone(),
            optional_placement_tags: config.optional_placement_tags.clone(),
            proxy_memory_mb,
            client,
            evacuation_reporter,
            allocator,
        })
    }

    pub fn with_instance_guid_generator(
        mut self,
        generate_instance_guid: InstanceGuidGenerator,
    ) -> Self {
        self.allocator.set_instance_guid_generator(generate_instance_guid);
        self
    }

    /// Build a fresh snapshot of the cell.
    ///
    /// Fails only when the inventory or capacity cannot be read; containers
    /// with unusable tags are logged and left out.
    #[tracing::instrument(name = "auction-state", skip_all, fields(cell_id = %self.cell_id))]
    pub async fn state(&self) -> AuctionResult<(CellState, bool)> {
        info!("providing");

        let containers = self
            .client
            .list_containers()
            .await
            .inspect_err(|e| error!(error = %e, "failed-to-fetch-containers"))?;
        let total_resources = self
            .client
            .total_resources()
            .await
            .inspect_err(|e| error!(error = %e, "failed-to-get-total-resources"))?;
        let available_resources = self
            .client
            .remaining_resources()
            .await
            .inspect_err(|e| error!(error = %e, "failed-to-get-remaining-resources"))?;
        let volume_drivers = self
            .client
            .volume_drivers()
            .await
            .inspect_err(|e| error!(error = %e, "failed-to-get-volume-drivers"))?;

        let mut lrps = Vec::new();
        let mut tasks = Vec::new();
        let mut starting_container_count = 0;

        for container in &containers {
            if container.state.is_starting() {
                starting_container_count += 1;
            }
            match self.classify(container) {
                Some(Workload::Lrp(lrp)) => lrps.push(lrp),
                Some(Workload::Task(task)) => tasks.push(task),
                None => {}
            }
        }

        let state = CellState {
            root_fs_providers: self.root_fs_providers.clone(),
            available_resources: cell_resources(&available_resources),
            total_resources: cell_resources(&total_resources),
            lrps,
            tasks,
            zone: self.zone.clone(),
            starting_container_count,
            evacuating: self.evacuation_reporter.evacuating(),
            volume_drivers,
            placement_tags: self.placement_tags.clone(),
            optional_placement_tags: self.optional_placement_tags.clone(),
        };

        let healthy = self.client.healthy().await;
        if !healthy {
            warn!("failed-executor-health-check");
        }

        info!(
            available_resources = ?state.available_resources,
            total_resources = ?state.total_resources,
            num_lrps = state.lrps.len(),
            num_tasks = state.tasks.len(),
            starting_containers = state.starting_container_count,
            zone = %state.zone,
            evacuating = state.evacuating,
            "provided"
        );

        Ok((state, healthy))
    }

    /// Rebuild the LRP or task a container was created for.
    fn classify(&self, container: &Container) -> Option<Workload> {
        let Some(tags) = container.tags.as_ref() else {
            error!(container_guid = %container.guid, "failed-to-extract-container-tags");
            return None;
        };

        let mut resource = container_resource(container);
        let placement_constraint = container_placement_constraint(container, tags);

        match tags.get(LIFECYCLE_TAG).map(String::as_str) {
            Some(LRP_LIFECYCLE) => {
                let keys = actual_lrp_key_from_tags(Some(tags)).and_then(|key| {
                    actual_lrp_instance_key_from_tags(Some(tags), &self.cell_id)
                        .map(|instance_key| (key, instance_key))
                });
                let (key, instance_key) = match keys {
                    Ok(keys) => keys,
                    Err(e) => {
                        error!(
                            container_guid = %container.guid,
                            error = %e,
                            "failed-to-extract-key"
                        );
                        return None;
                    }
                };
                resource.memory_mb =
                    lrp_requested_memory_mb(resource.memory_mb, self.proxy_memory_mb);
                Some(Workload::Lrp(Lrp::new(
                    instance_key.instance_guid,
                    key,
                    resource,
                    placement_constraint,
                )))
            }
            Some(TASK_LIFECYCLE) => {
                let domain = tags.get(DOMAIN_TAG).cloned().unwrap_or_default();
                Some(Workload::Task(Task::new(
                    container.guid.clone(),
                    domain,
                    resource,
                    placement_constraint,
                )))
            }
            _ => None,
        }
    }

    /// Try to start `work` on this cell. Returns what could not be started.
    ///
    /// An evacuating cell refuses everything without touching the executor.
    /// LRPs are submitted before tasks; each class fails independently.
    #[tracing::instrument(
        name = "auction-perform",
        skip_all,
        fields(num_lrps = work.lrps.len(), num_tasks = work.tasks.len())
    )]
    pub async fn perform(&self, work: Work) -> AuctionResult<Work> {
        if self.evacuation_reporter.evacuating() {
            info!("refusing-work-while-evacuating");
            return Ok(work);
        }

        let mut failed = Work::default();

        if !work.lrps.is_empty() {
            failed.lrps = self.allocator.batch_lrp_allocation_request(&work.lrps).await;
        }

        if !work.tasks.is_empty() {
            failed.tasks = self.allocator.batch_task_allocation_request(&work.tasks).await;
        }

        info!(
            num_failed_lrps = failed.lrps.len(),
            num_failed_tasks = failed.tasks.len(),
            "performed"
        );
        Ok(failed)
    }

    /// Resetting is only supported by simulated cells.
    pub fn reset(&self) -> AuctionResult<()> {
        Err(AuctionError::NotASimulation)
    }
}

enum Workload {
    Lrp(Lrp),
    Task(Task),
}

impl AuctionCellClient for AuctionCellRep {
    fn state(&self) -> AuctionFuture<'_, (CellState, bool)> {
        Box::pin(AuctionCellRep::state(self))
    }

    fn perform(&self, work: Work) -> AuctionFuture<'_, Work> {
        Box::pin(AuctionCellRep::perform(self, work))
    }

    fn reset(&self) -> AuctionResult<()> {
        AuctionCellRep::reset(self)
    }
}
