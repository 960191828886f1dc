use cellrep_core::{RepConfig, RootFsProviders};
use serde::Serialize;
use tracing::info;

/// What this cell will advertise to the auctioneer.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub cell_id: String,
    pub zone: String,
    pub root_fs_providers: RootFsProviders,
    pub placement_tags: Vec<String>,
    pub optional_placement_tags: Vec<String>,
    /// Extra memory added to every LRP container, when the proxy is enabled.
    pub proxy_memory_mb: Option<i32>,
}

pub fn report(config: &RepConfig) -> anyhow::Result<ConfigReport> {
    let root_fs_providers = config.root_fs_providers()?;
    info!(
        cell_id = %config.cell_id,
        num_providers = root_fs_providers.len(),
        "config-valid"
    );

    Ok(ConfigReport {
        cell_id: config.cell_id.clone(),
        zone: config.zone.clone(),
        root_fs_providers,
        placement_tags: config.placement_tags.clone(),
        optional_placement_tags: config.optional_placement_tags.clone(),
        proxy_memory_mb: config
            .enable_container_proxy
            .then_some(config.proxy_memory_allocation_mb),
    })
}

pub fn check_config(config: &RepConfig) -> anyhow::Result<()> {
    let report = report(config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
