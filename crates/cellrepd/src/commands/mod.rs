pub mod check_config;
pub mod resolve_rootfs;

use std::path::Path;

use anyhow::Context;
use cellrep_core::RepConfig;

/// Load and validate `rep.toml`.
pub fn load_config(path: &Path) -> anyhow::Result<RepConfig> {
    RepConfig::from_file(path).with_context(|| format!("loading {}", path.display()))
}
