use anyhow::Context;
use cellrep_core::{RepConfig, path_for_root_fs};
use serde::Serialize;
use tracing::warn;

/// Outcome of resolving one rootfs reference on this cell.
#[derive(Debug, Serialize)]
pub struct Resolution {
    pub reference: String,
    /// What container allocation would hand to the runtime.
    pub path: String,
    /// Whether the cell advertises a provider that serves the reference.
    pub servable: bool,
}

/// Resolve a rootfs reference the same way container allocation does.
pub fn resolve(config: &RepConfig, reference: &str) -> anyhow::Result<Resolution> {
    let stacks = config.stack_path_map()?;
    let path =
        path_for_root_fs(reference, &stacks).with_context(|| format!("resolving {reference:?}"))?;

    let servable = config.root_fs_providers()?.match_root_fs(reference);
    if !servable {
        warn!(reference, "rootfs-not-advertised-by-cell");
    }

    Ok(Resolution {
        reference: reference.to_string(),
        path,
        servable,
    })
}

pub fn resolve_rootfs(config: &RepConfig, reference: &str) -> anyhow::Result<()> {
    let resolution = resolve(config, reference)?;
    println!("{}", serde_json::to_string_pretty(&resolution)?);
    Ok(())
}
