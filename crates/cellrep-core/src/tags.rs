//! Container tag keys and the codec for list-valued tags.
//!
//! The runtime only stores a flat `String → String` map per container.
//! Lists (placement tags, volume drivers) are stored JSON-encoded under a
//! single key.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::error;

/// Flat tag map attached to every container.
pub type Tags = BTreeMap<String, String>;

pub const LIFECYCLE_TAG: &str = "lifecycle";
pub const DOMAIN_TAG: &str = "domain";
pub const PROCESS_GUID_TAG: &str = "process-guid";
pub const PROCESS_INDEX_TAG: &str = "process-index";
pub const INSTANCE_GUID_TAG: &str = "instance-guid";
pub const PLACEMENT_TAGS_TAG: &str = "placement-tags";
pub const VOLUME_DRIVERS_TAG: &str = "volume-drivers";

pub const LRP_LIFECYCLE: &str = "lrp";
pub const TASK_LIFECYCLE: &str = "task";

#[derive(Debug, Error)]
pub enum TagError {
    #[error("failed to decode tag {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Container guid for an LRP instance.
pub fn lrp_container_guid(process_guid: &str, instance_guid: &str) -> String {
    format!("{process_guid}-{instance_guid}")
}

/// Encode a list as a single tag value (a JSON array of strings).
pub fn encode_list(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}

/// Decode a list-valued tag. A missing key is an error, as is anything
/// that is not a JSON array of strings.
pub fn decode_list(tags: &Tags, key: &str) -> Result<Vec<String>, TagError> {
    let raw = tags.get(key).map(String::as_str).unwrap_or_default();
    serde_json::from_str(raw).map_err(|source| TagError::Decode {
        key: key.to_string(),
        source,
    })
}

/// Decode a list-valued tag, logging and falling back to an empty list on
/// malformed input. One corrupt container must not hide the rest.
pub fn decode_list_lossy(tags: &Tags, key: &str) -> Vec<String> {
    match decode_list(tags, key) {
        Ok(values) => values,
        Err(e) => {
            error!(
                tag = key,
                value = tags.get(key).map(String::as_str).unwrap_or_default(),
                error = %e,
                "cannot-unmarshal-tag"
            );
            Vec::new()
        }
    }
}

/// Insert a list-valued tag.
pub fn insert_list(tags: &mut Tags, key: &str, values: &[String]) {
    tags.insert(key.to_string(), encode_list(values));
}
