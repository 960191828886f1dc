//! cellrep-core — shared types for the cell rep.
//!
//! - **`types`** — LRPs, tasks, work batches, and cell state snapshots
//! - **`rootfs`** — root filesystem providers and resolution
//! - **`tags`** — container tag keys and the list-valued tag codec
//! - **`keys`** — LRP identity reconstruction from container tags
//! - **`config`** — `rep.toml` parsing

pub mod config;
pub mod keys;
pub mod rootfs;
pub mod tags;
pub mod types;

pub use config::{ConfigError, RepConfig};
pub use keys::{LrpKeyError, actual_lrp_instance_key_from_tags, actual_lrp_key_from_tags};
pub use rootfs::{RootFsError, RootFsProvider, RootFsProviders, StackPathMap, path_for_root_fs};
pub use tags::{TagError, Tags};
pub use types::*;
