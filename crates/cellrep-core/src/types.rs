//! Domain types exchanged with the auctioneer.
//!
//! These types describe what a cell advertises (`CellState`) and what the
//! auctioneer asks it to run (`Work`). They are plain values: a snapshot is
//! built fresh on every state request and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::rootfs::RootFsProviders;

/// Resource shape of a single schedulable unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub memory_mb: i32,
    pub disk_mb: i32,
    pub max_pids: i32,
}

impl Resource {
    pub fn new(memory_mb: i32, disk_mb: i32, max_pids: i32) -> Self {
        Self {
            memory_mb,
            disk_mb,
            max_pids,
        }
    }
}

/// Aggregate capacity of a cell (total or remaining).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellResources {
    pub memory_mb: i32,
    pub disk_mb: i32,
    pub containers: i32,
}

impl CellResources {
    pub fn new(memory_mb: i32, disk_mb: i32, containers: i32) -> Self {
        Self {
            memory_mb,
            disk_mb,
            containers,
        }
    }
}

/// The environment a unit requires (or, for a running unit, the one it got).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlacementConstraint {
    /// Root filesystem reference. For observed units this is the concrete
    /// path the container was created with.
    pub root_fs: String,
    #[serde(default)]
    pub volume_drivers: Vec<String>,
    #[serde(default)]
    pub placement_tags: Vec<String>,
}

impl PlacementConstraint {
    pub fn new(
        root_fs: impl Into<String>,
        volume_drivers: Vec<String>,
        placement_tags: Vec<String>,
    ) -> Self {
        Self {
            root_fs: root_fs.into(),
            volume_drivers,
            placement_tags,
        }
    }
}

/// Identity of an LRP replica: which process, which index, which domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActualLrpKey {
    pub process_guid: String,
    pub index: i32,
    pub domain: String,
}

impl ActualLrpKey {
    pub fn new(process_guid: impl Into<String>, index: i32, domain: impl Into<String>) -> Self {
        Self {
            process_guid: process_guid.into(),
            index,
            domain: domain.into(),
        }
    }
}

/// Which instance of an LRP replica, on which cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActualLrpInstanceKey {
    pub instance_guid: String,
    pub cell_id: String,
}

impl ActualLrpInstanceKey {
    pub fn new(instance_guid: impl Into<String>, cell_id: impl Into<String>) -> Self {
        Self {
            instance_guid: instance_guid.into(),
            cell_id: cell_id.into(),
        }
    }
}

/// A long-running-process instance, either observed on the cell or
/// requested by the auctioneer (in which case `instance_guid` is empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lrp {
    #[serde(default)]
    pub instance_guid: String,
    #[serde(flatten)]
    pub key: ActualLrpKey,
    pub resource: Resource,
    pub placement_constraint: PlacementConstraint,
}

impl Lrp {
    pub fn new(
        instance_guid: impl Into<String>,
        key: ActualLrpKey,
        resource: Resource,
        placement_constraint: PlacementConstraint,
    ) -> Self {
        Self {
            instance_guid: instance_guid.into(),
            key,
            resource,
            placement_constraint,
        }
    }

    pub fn process_guid(&self) -> &str {
        &self.key.process_guid
    }

    pub fn index(&self) -> i32 {
        self.key.index
    }

    pub fn domain(&self) -> &str {
        &self.key.domain
    }

    pub fn root_fs(&self) -> &str {
        &self.placement_constraint.root_fs
    }
}

/// A one-shot unit of work.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub task_guid: String,
    pub domain: String,
    pub resource: Resource,
    pub placement_constraint: PlacementConstraint,
}

impl Task {
    pub fn new(
        task_guid: impl Into<String>,
        domain: impl Into<String>,
        resource: Resource,
        placement_constraint: PlacementConstraint,
    ) -> Self {
        Self {
            task_guid: task_guid.into(),
            domain: domain.into(),
            resource,
            placement_constraint,
        }
    }

    pub fn root_fs(&self) -> &str {
        &self.placement_constraint.root_fs
    }
}

/// A batch of start requests, or the residual subset that failed to start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Work {
    #[serde(default)]
    pub lrps: Vec<Lrp>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Work {
    pub fn new(lrps: Vec<Lrp>, tasks: Vec<Task>) -> Self {
        Self { lrps, tasks }
    }

    pub fn is_empty(&self) -> bool {
        self.lrps.is_empty() && self.tasks.is_empty()
    }
}

/// Point-in-time snapshot of a cell's capacity and workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellState {
    pub root_fs_providers: RootFsProviders,
    pub available_resources: CellResources,
    pub total_resources: CellResources,
    pub lrps: Vec<Lrp>,
    pub tasks: Vec<Task>,
    pub zone: String,
    /// Containers still being created. Auctioneers treat this as backpressure.
    pub starting_container_count: usize,
    pub evacuating: bool,
    pub volume_drivers: Vec<String>,
    pub placement_tags: Vec<String>,
    pub optional_placement_tags: Vec<String>,
}
