//! cellrep-auction — the cell's side of the placement auction.
//!
//! Answers two questions from the auctioneer:
//!
//! - **state**: what is running here and how much room is left
//! - **perform**: reserve containers for this batch of LRPs and tasks,
//!   and report back whatever could not be placed
//!
//! # Architecture
//!
//! ```text
//! AuctionCellRep
//!   ├── ExecutorClient (inventory, capacity, health, allocation)
//!   ├── EvacuationReporter (refuse work while draining)
//!   └── ContainerAllocator
//!       ├── rootfs resolution (preloaded stacks → paths)
//!       ├── tag encoding (LRP / task identity on the container)
//!       └── failure reconciliation (refused guid → original work item)
//! ```

pub mod allocator;
pub mod cell_rep;
pub mod convert;
pub mod error;
pub mod evacuation;

pub use allocator::{ContainerAllocator, InstanceGuidGenerator, uuid_instance_guid_generator};
pub use cell_rep::{AuctionCellClient, AuctionCellRep, AuctionFuture};
pub use error::{AuctionError, AuctionResult, GuidError, TranslateError};
pub use evacuation::{EvacuationContext, EvacuationReporter};
