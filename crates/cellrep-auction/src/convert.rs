//! Conversions between executor records and auction types.

use cellrep_core::tags::{PLACEMENT_TAGS_TAG, VOLUME_DRIVERS_TAG, decode_list_lossy};
use cellrep_core::{CellResources, PlacementConstraint, Resource, Tags};
use cellrep_executor::{Container, ExecutorResources};

/// Cell capacity as advertised to the auctioneer.
pub fn cell_resources(resources: &ExecutorResources) -> CellResources {
    CellResources::new(resources.memory_mb, resources.disk_mb, resources.containers)
}

/// Resource shape recorded on a container.
pub fn container_resource(container: &Container) -> Resource {
    Resource::new(container.memory_mb, container.disk_mb, container.max_pids)
}

/// Placement constraint of a running container. Undecodable list tags
/// are logged and left empty.
pub fn container_placement_constraint(container: &Container, tags: &Tags) -> PlacementConstraint {
    PlacementConstraint::new(
        container.root_fs_path.clone(),
        decode_list_lossy(tags, VOLUME_DRIVERS_TAG),
        decode_list_lossy(tags, PLACEMENT_TAGS_TAG),
    )
}

/// Memory to request for an LRP container, including proxy overhead.
pub fn lrp_allocation_memory_mb(memory_mb: i32, proxy_memory_mb: Option<i32>) -> i32 {
    match proxy_memory_mb {
        Some(proxy) if memory_mb > 0 => memory_mb.saturating_add(proxy),
        _ => memory_mb,
    }
}

/// Memory an LRP asked for, given what its container reserved.
pub fn lrp_requested_memory_mb(container_memory_mb: i32, proxy_memory_mb: Option<i32>) -> i32 {
    match proxy_memory_mb {
        Some(proxy) if container_memory_mb > 0 => container_memory_mb.saturating_sub(proxy).max(0),
        _ => container_memory_mb,
    }
}
