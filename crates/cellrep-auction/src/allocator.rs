//! Container allocator — turns auction work into executor reservations.
//!
//! Each work class (LRPs, tasks) is translated into allocation requests,
//! submitted to the executor as one batch, and the refused container guids
//! are folded back through a guid → work item map:
//!
//! ```text
//! &[Lrp] ──translate──▶ Translation { requests, by_guid, untranslated }
//!                            │
//!                 allocate_containers(requests)
//!                            │
//!        Ok(failures) ──▶ untranslated + by_guid[failure.guid]
//!        Err(_)       ──▶ every input item
//! ```
//!
//! Nothing is rolled back: some requests in a batch may be reserved while
//! others are refused, and the allocator only reports the split.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info, warn};
use uuid::Uuid;

use cellrep_core::tags::{
    DOMAIN_TAG, INSTANCE_GUID_TAG, LIFECYCLE_TAG, LRP_LIFECYCLE, PLACEMENT_TAGS_TAG,
    PROCESS_GUID_TAG, PROCESS_INDEX_TAG, TASK_LIFECYCLE, VOLUME_DRIVERS_TAG, insert_list,
    lrp_container_guid,
};
use cellrep_core::{Lrp, PlacementConstraint, StackPathMap, Tags, Task, path_for_root_fs};
use cellrep_executor::{AllocationRequest, AllocationResource, ExecutorClient};

use crate::convert::lrp_allocation_memory_mb;
use crate::error::{GuidError, TranslateError};

/// Source of fresh LRP instance guids.
pub type InstanceGuidGenerator = Arc<dyn Fn() -> Result<String, GuidError> + Send + Sync>;

/// Random v4 UUIDs.
pub fn uuid_instance_guid_generator() -> InstanceGuidGenerator {
    Arc::new(|| Ok(Uuid::new_v4().to_string()))
}

/// Allocation requests for one work class, plus what is needed to attribute
/// failures back to the items that produced them.
#[derive(Debug)]
pub struct Translation<'a, T> {
    pub requests: Vec<AllocationRequest>,
    /// Container guid → originating work item. One entry per request.
    pub by_guid: HashMap<String, &'a T>,
    /// Items that never became a request.
    pub untranslated: Vec<&'a T>,
}

impl<'a, T> Translation<'a, T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            requests: Vec::with_capacity(capacity),
            by_guid: HashMap::with_capacity(capacity),
            untranslated: Vec::new(),
        }
    }

    /// Record a request for `item`. Refuses a guid already in the batch so
    /// the guid → item map stays one-to-one.
    fn push(&mut self, request: AllocationRequest, item: &'a T) -> bool {
        if self.by_guid.contains_key(&request.guid) {
            return false;
        }
        self.by_guid.insert(request.guid.clone(), item);
        self.requests.push(request);
        true
    }

    fn reject(&mut self, item: &'a T) {
        self.untranslated.push(item);
    }
}

/// Translates and submits batches of work against one executor.
#[derive(Clone)]
pub struct ContainerAllocator {
    client: Arc<dyn ExecutorClient>,
    stack_path_map: StackPathMap,
    generate_instance_guid: InstanceGuidGenerator,
    /// Extra memory reserved per LRP container when the proxy is enabled.
    proxy_memory_mb: Option<i32>,
}

impl ContainerAllocator {
    pub fn new(
        client: Arc<dyn ExecutorClient>,
        stack_path_map: StackPathMap,
        generate_instance_guid: InstanceGuidGenerator,
    ) -> Self {
        Self {
            client,
            stack_path_map,
            generate_instance_guid,
            proxy_memory_mb: None,
        }
    }

    /// Reserve `proxy_memory_mb` on top of every LRP's memory.
    pub fn with_container_proxy(mut self, proxy_memory_mb: i32) -> Self {
        self.proxy_memory_mb = Some(proxy_memory_mb);
        self
    }

    pub fn set_instance_guid_generator(&mut self, generate_instance_guid: InstanceGuidGenerator) {
        self.generate_instance_guid = generate_instance_guid;
    }

    /// Reserve containers for `lrps`. Returns the LRPs that were not reserved.
    #[tracing::instrument(name = "lrp-allocate-instances", skip_all, fields(num_lrps = lrps.len()))]
    pub async fn batch_lrp_allocation_request(&self, lrps: &[Lrp]) -> Vec<Lrp> {
        let translation = self.lrps_to_allocation_requests(lrps);
        self.allocate(lrps, translation).await
    }

    /// Reserve containers for `tasks`. Returns the tasks that were not reserved.
    #[tracing::instrument(
        name = "task-allocate-instances",
        skip_all,
        fields(num_tasks = tasks.len())
    )]
    pub async fn batch_task_allocation_request(&self, tasks: &[Task]) -> Vec<Task> {
        let translation = self.tasks_to_allocation_requests(tasks);
        self.allocate(tasks, translation).await
    }

    pub fn lrps_to_allocation_requests<'a>(&self, lrps: &'a [Lrp]) -> Translation<'a, Lrp> {
        let mut translation = Translation::with_capacity(lrps.len());

        for lrp in lrps {
            match self.lrp_allocation_request(lrp) {
                Ok(request) => {
                    let guid = request.guid.clone();
                    if !translation.push(request, lrp) {
                        warn!(
                            container_guid = %guid,
                            process_guid = %lrp.process_guid(),
                            "duplicate-container-guid-in-batch"
                        );
                        translation.reject(lrp);
                    }
                }
                Err(e) => {
                    error!(
                        process_guid = %lrp.process_guid(),
                        index = lrp.index(),
                        error = %e,
                        "failed-to-translate-lrp"
                    );
                    translation.reject(lrp);
                }
            }
        }

        translation
    }

    pub fn tasks_to_allocation_requests<'a>(&self, tasks: &'a [Task]) -> Translation<'a, Task> {
        let mut translation = Translation::with_capacity(tasks.len());

        for task in tasks {
            match self.task_allocation_request(task) {
                Ok(request) => {
                    if !translation.push(request, task) {
                        warn!(task_guid = %task.task_guid, "duplicate-container-guid-in-batch");
                        translation.reject(task);
                    }
                }
                Err(e) => {
                    error!(task_guid = %task.task_guid, error = %e, "failed-to-translate-task");
                    translation.reject(task);
                }
            }
        }

        translation
    }

    fn lrp_allocation_request(&self, lrp: &Lrp) -> Result<AllocationRequest, TranslateError> {
        let instance_guid = (self.generate_instance_guid)()?;
        let root_fs_path = path_for_root_fs(lrp.root_fs(), &self.stack_path_map)?;

        let mut tags = Tags::new();
        tags.insert(DOMAIN_TAG.to_string(), lrp.domain().to_string());
        tags.insert(PROCESS_GUID_TAG.to_string(), lrp.process_guid().to_string());
        tags.insert(PROCESS_INDEX_TAG.to_string(), lrp.index().to_string());
        tags.insert(LIFECYCLE_TAG.to_string(), LRP_LIFECYCLE.to_string());
        tags.insert(INSTANCE_GUID_TAG.to_string(), instance_guid.clone());
        insert_constraint_tags(&mut tags, &lrp.placement_constraint);

        let resource = AllocationResource::new(
            lrp_allocation_memory_mb(lrp.resource.memory_mb, self.proxy_memory_mb),
            lrp.resource.disk_mb,
            lrp.resource.max_pids,
            root_fs_path,
        );
        let guid = lrp_container_guid(lrp.process_guid(), &instance_guid);
        Ok(AllocationRequest::new(guid, resource, tags))
    }

    fn task_allocation_request(&self, task: &Task) -> Result<AllocationRequest, TranslateError> {
        let root_fs_path = path_for_root_fs(task.root_fs(), &self.stack_path_map)?;

        let mut tags = Tags::new();
        tags.insert(LIFECYCLE_TAG.to_string(), TASK_LIFECYCLE.to_string());
        tags.insert(DOMAIN_TAG.to_string(), task.domain.clone());
        insert_constraint_tags(&mut tags, &task.placement_constraint);

        let resource = AllocationResource::new(
            task.resource.memory_mb,
            task.resource.disk_mb,
            task.resource.max_pids,
            root_fs_path,
        );
        // Tasks run at most once, so the task guid is the container guid.
        Ok(AllocationRequest::new(task.task_guid.clone(), resource, tags))
    }

    /// Submit a translated batch and collect everything that did not make it.
    async fn allocate<'a, T: Clone>(
        &self,
        work: &'a [T],
        translation: Translation<'a, T>,
    ) -> Vec<T> {
        let Translation {
            requests,
            mut by_guid,
            untranslated,
        } = translation;

        let mut failed: Vec<T> = untranslated.into_iter().cloned().collect();
        if !failed.is_empty() {
            info!(num_failed_to_translate = failed.len(), "failed-to-translate-work-to-containers");
        }

        if requests.is_empty() {
            return failed;
        }

        info!(num_requesting_allocation = requests.len(), "requesting-container-allocation");
        let failures = match self.client.allocate_containers(requests).await {
            Ok(failures) => failures,
            Err(e) => {
                // Nothing can be assumed received; the whole class is retried.
                error!(error = %e, "failed-requesting-container-allocation");
                return work.to_vec();
            }
        };

        info!(num_failed_to_allocate = failures.len(), "succeeded-requesting-container-allocation");
        for failure in &failures {
            error!(
                container_guid = %failure.guid(),
                reason = %failure.reason,
                memory_mb = failure.request.resource.memory_mb,
                disk_mb = failure.request.resource.disk_mb,
                "container-allocation-failure"
            );
            match by_guid.remove(failure.guid()) {
                Some(item) => failed.push(item.clone()),
                None => warn!(
                    container_guid = %failure.guid(),
                    "allocation-failure-for-unknown-container"
                ),
            }
        }

        failed
    }
}

fn insert_constraint_tags(tags: &mut Tags, constraint: &PlacementConstraint) {
    insert_list(tags, PLACEMENT_TAGS_TAG, &constraint.placement_tags);
    insert_list(tags, VOLUME_DRIVERS_TAG, &constraint.volume_drivers);
}
