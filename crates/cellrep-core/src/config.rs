//! Cell rep configuration (`rep.toml`).
//!
//! ```toml
//! cell_id = "cell_z1/10"
//! zone = "z1"
//! preloaded_root_fs = ["cflinuxfs4:/var/vcap/packages/cflinuxfs4/rootfs.tar"]
//! supported_providers = ["docker"]
//! placement_tags = ["isolation-segment-a"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rootfs::{RootFsProviders, StackPathMap};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid preloaded rootfs entry {0:?}: expected name:path")]
    InvalidRootFs(String),
    #[error("duplicate preloaded rootfs: {0}")]
    DuplicateRootFs(String),
    #[error("cell_id must not be empty")]
    MissingCellId,
    #[error("proxy_memory_allocation_mb must not be negative, got {0}")]
    NegativeProxyMemory(i32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepConfig {
    pub cell_id: String,
    #[serde(default)]
    pub zone: String,
    /// Preloaded stacks as `name:path` entries.
    #[serde(default)]
    pub preloaded_root_fs: Vec<String>,
    /// Schemes the runtime fetches on its own (e.g. `docker`).
    #[serde(default)]
    pub supported_providers: Vec<String>,
    #[serde(default)]
    pub placement_tags: Vec<String>,
    #[serde(default)]
    pub optional_placement_tags: Vec<String>,
    #[serde(default)]
    pub enable_container_proxy: bool,
    #[serde(default)]
    pub proxy_memory_allocation_mb: i32,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl RepConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: RepConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_id.is_empty() {
            return Err(ConfigError::MissingCellId);
        }
        if self.proxy_memory_allocation_mb < 0 {
            return Err(ConfigError::NegativeProxyMemory(self.proxy_memory_allocation_mb));
        }
        self.stack_path_map().map(|_| ())
    }

    /// Preloaded stack name → path. Entries split on the first `:`.
    pub fn stack_path_map(&self) -> Result<StackPathMap, ConfigError> {
        let mut map = StackPathMap::new();
        for entry in &self.preloaded_root_fs {
            let (name, path) = entry
                .split_once(':')
                .filter(|(name, path)| !name.is_empty() && !path.is_empty())
                .ok_or_else(|| ConfigError::InvalidRootFs(entry.clone()))?;
            if map.insert(name.to_string(), path.to_string()).is_some() {
                return Err(ConfigError::DuplicateRootFs(name.to_string()));
            }
        }
        Ok(map)
    }

    pub fn root_fs_providers(&self) -> Result<RootFsProviders, ConfigError> {
        let stacks = self.stack_path_map()?;
        Ok(RootFsProviders::new(&stacks, self.supported_providers.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::rootfs::RootFsProvider;

    const FULL: &str = r#"
cell_id = "cell_z1/10"
zone = "test-zone"
preloaded_root_fs = ["test:value", "test2:/var/stacks/test2"]
supported_providers = ["provider1", "provider2"]
placement_tags = ["tag1", "tag2"]
optional_placement_tags = ["otag1", "otag2"]
enable_container_proxy = true
proxy_memory_allocation_mb = 6
log_level = "debug"
"#;

    #[test]
    fn parses_all_fields() {
        let config = RepConfig::from_toml_str(FULL).unwrap();

        assert_eq!(config.cell_id, "cell_z1/10");
        assert_eq!(config.zone, "test-zone");
        assert_eq!(config.supported_providers, vec!["provider1", "provider2"]);
        assert_eq!(config.placement_tags, vec!["tag1", "tag2"]);
        assert_eq!(config.optional_placement_tags, vec!["otag1", "otag2"]);
        assert!(config.enable_container_proxy);
        assert_eq!(config.proxy_memory_allocation_mb, 6);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn uses_defaults_when_unspecified() {
        let config = RepConfig::from_toml_str(r#"cell_id = "cell-1""#).unwrap();

        assert_eq!(config.zone, "");
        assert!(config.preloaded_root_fs.is_empty());
        assert!(config.supported_providers.is_empty());
        assert!(!config.enable_container_proxy);
        assert_eq!(config.proxy_memory_allocation_mb, 0);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn stack_path_map_splits_on_first_colon() {
        let config = RepConfig::from_toml_str(
            r#"
cell_id = "cell-1"
preloaded_root_fs = ["windows:C:\\stacks\\windows"]
"#,
        )
        .unwrap();

        let map = config.stack_path_map().unwrap();
        assert_eq!(map.get("windows").map(String::as_str), Some("C:\\stacks\\windows"));
    }

    #[test]
    fn rejects_malformed_rootfs_entries() {
        for entry in ["no-separator", ":/path", "name:"] {
            let toml = format!("cell_id = \"c\"\npreloaded_root_fs = [\"{entry}\"]\n");
            let err = RepConfig::from_toml_str(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRootFs(_)), "{entry}");
        }
    }

    #[test]
    fn rejects_duplicate_stacks() {
        let toml = r#"
cell_id = "c"
preloaded_root_fs = ["a:/one", "a:/two"]
"#;
        let err = RepConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRootFs(ref s) if s == "a"));
    }

    #[test]
    fn rejects_empty_cell_id() {
        let err = RepConfig::from_toml_str(r#"cell_id = """#).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCellId));
    }

    #[test]
    fn rejects_negative_proxy_memory() {
        let err = RepConfig::from_toml_str(
            "cell_id = \"c\"\nenable_container_proxy = true\nproxy_memory_allocation_mb = -32",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeProxyMemory(-32)));

        // Checked even while the proxy is disabled.
        let err = RepConfig::from_toml_str("cell_id = \"c\"\nproxy_memory_allocation_mb = -1")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeProxyMemory(-1)));
    }

    #[test]
    fn rejects_invalid_toml() {
        let err = RepConfig::from_toml_str("{{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn builds_root_fs_providers() {
        let config = RepConfig::from_toml_str(FULL).unwrap();
        let providers = config.root_fs_providers().unwrap();

        assert_eq!(providers.get("provider1"), Some(&RootFsProvider::Arbitrary));
        assert_eq!(
            providers.get("preloaded"),
            Some(&RootFsProvider::fixed_set(["test", "test2"]))
        );
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let config = RepConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cell_id, "cell_z1/10");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = RepConfig::from_file(Path::new("/nonexistent/rep.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
