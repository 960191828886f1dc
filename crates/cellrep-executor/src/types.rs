//! Records exchanged with the container runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Flat string tag map the runtime stores per container.
pub type Tags = BTreeMap<String, String>;

/// Lifecycle state of a runtime container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerState {
    Invalid,
    Reserved,
    Initializing,
    Created,
    Running,
    Completed,
}

impl ContainerState {
    /// Reserved but not yet running. These hold capacity without doing work.
    pub fn is_starting(self) -> bool {
        matches!(
            self,
            ContainerState::Reserved | ContainerState::Initializing | ContainerState::Created
        )
    }
}

/// A container as reported by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub guid: String,
    pub state: ContainerState,
    pub memory_mb: i32,
    pub disk_mb: i32,
    pub max_pids: i32,
    pub root_fs_path: String,
    /// `None` when the runtime lost or never recorded the container's tags.
    pub tags: Option<Tags>,
}

impl Container {
    pub fn new(guid: impl Into<String>, state: ContainerState) -> Self {
        Self {
            guid: guid.into(),
            state,
            memory_mb: 0,
            disk_mb: 0,
            max_pids: 0,
            root_fs_path: String::new(),
            tags: None,
        }
    }

    pub fn with_resource(mut self, memory_mb: i32, disk_mb: i32, max_pids: i32) -> Self {
        self.memory_mb = memory_mb;
        self.disk_mb = disk_mb;
        self.max_pids = max_pids;
        self
    }

    pub fn with_root_fs_path(mut self, root_fs_path: impl Into<String>) -> Self {
        self.root_fs_path = root_fs_path.into();
        self
    }

    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Aggregate capacity as the runtime accounts for it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorResources {
    pub memory_mb: i32,
    pub disk_mb: i32,
    pub containers: i32,
}

impl ExecutorResources {
    pub fn new(memory_mb: i32, disk_mb: i32, containers: i32) -> Self {
        Self {
            memory_mb,
            disk_mb,
            containers,
        }
    }
}

/// Resource shape of a container to reserve.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResource {
    pub memory_mb: i32,
    pub disk_mb: i32,
    pub max_pids: i32,
    pub root_fs_path: String,
}

impl AllocationResource {
    pub fn new(
        memory_mb: i32,
        disk_mb: i32,
        max_pids: i32,
        root_fs_path: impl Into<String>,
    ) -> Self {
        Self {
            memory_mb,
            disk_mb,
            max_pids,
            root_fs_path: root_fs_path.into(),
        }
    }
}

/// One container reservation in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Container guid; unique within a batch.
    pub guid: String,
    pub resource: AllocationResource,
    pub tags: Tags,
}

impl AllocationRequest {
    pub fn new(guid: impl Into<String>, resource: AllocationResource, tags: Tags) -> Self {
        Self {
            guid: guid.into(),
            resource,
            tags,
        }
    }
}

/// A request the runtime refused, with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationFailure {
    pub request: AllocationRequest,
    pub reason: String,
}

impl AllocationFailure {
    pub fn new(request: AllocationRequest, reason: impl Into<String>) -> Self {
        Self {
            request,
            reason: reason.into(),
        }
    }

    pub fn guid(&self) -> &str {
        &self.request.guid
    }
}

impl fmt::Display for AllocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocation of {} failed: {}", self.request.guid, self.reason)
    }
}
