//! Reconstruct LRP identity from container tags.

use thiserror::Error;

use crate::tags::{DOMAIN_TAG, INSTANCE_GUID_TAG, PROCESS_GUID_TAG, PROCESS_INDEX_TAG, Tags};
use crate::types::{ActualLrpInstanceKey, ActualLrpKey};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LrpKeyError {
    #[error("container is missing tags")]
    MissingTags,
    #[error("invalid process index: {0:?}")]
    InvalidProcessIndex(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Extract the `(process_guid, index, domain)` key of an LRP container.
pub fn actual_lrp_key_from_tags(tags: Option<&Tags>) -> Result<ActualLrpKey, LrpKeyError> {
    let tags = tags.ok_or(LrpKeyError::MissingTags)?;

    let raw_index = tag(tags, PROCESS_INDEX_TAG);
    let index: i32 = raw_index
        .parse()
        .map_err(|_| LrpKeyError::InvalidProcessIndex(raw_index.to_string()))?;
    if index < 0 {
        return Err(LrpKeyError::InvalidProcessIndex(raw_index.to_string()));
    }

    let key = ActualLrpKey::new(tag(tags, PROCESS_GUID_TAG), index, tag(tags, DOMAIN_TAG));
    if key.process_guid.is_empty() {
        return Err(LrpKeyError::MissingField("process_guid"));
    }
    if key.domain.is_empty() {
        return Err(LrpKeyError::MissingField("domain"));
    }
    Ok(key)
}

/// Extract the `(instance_guid, cell_id)` key of an LRP container on this cell.
pub fn actual_lrp_instance_key_from_tags(
    tags: Option<&Tags>,
    cell_id: &str,
) -> Result<ActualLrpInstanceKey, LrpKeyError> {
    let tags = tags.ok_or(LrpKeyError::MissingTags)?;

    let key = ActualLrpInstanceKey::new(tag(tags, INSTANCE_GUID_TAG), cell_id);
    if key.instance_guid.is_empty() {
        return Err(LrpKeyError::MissingField("instance_guid"));
    }
    if key.cell_id.is_empty() {
        return Err(LrpKeyError::MissingField("cell_id"));
    }
    Ok(key)
}

fn tag<'a>(tags: &'a Tags, key: &str) -> &'a str {
    tags.get(key).map(String::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lrp_tags() -> Tags {
        let mut tags = Tags::new();
        tags.insert(PROCESS_GUID_TAG.to_string(), "p1".to_string());
        tags.insert(PROCESS_INDEX_TAG.to_string(), "3".to_string());
        tags.insert(DOMAIN_TAG.to_string(), "cf-apps".to_string());
        tags.insert(INSTANCE_GUID_TAG.to_string(), "ig-1".to_string());
        tags
    }

    #[test]
    fn extracts_lrp_key() {
        let key = actual_lrp_key_from_tags(Some(&lrp_tags())).unwrap();
        assert_eq!(key, ActualLrpKey::new("p1", 3, "cf-apps"));
    }

    #[test]
    fn missing_tags_are_rejected() {
        assert_eq!(actual_lrp_key_from_tags(None), Err(LrpKeyError::MissingTags));
        assert_eq!(
            actual_lrp_instance_key_from_tags(None, "cell-1"),
            Err(LrpKeyError::MissingTags)
        );
    }

    #[test]
    fn non_numeric_index_is_rejected() {
        let mut tags = lrp_tags();
        tags.insert(PROCESS_INDEX_TAG.to_string(), "three".to_string());
        assert!(matches!(
            actual_lrp_key_from_tags(Some(&tags)),
            Err(LrpKeyError::InvalidProcessIndex(_))
        ));

        tags.remove(PROCESS_INDEX_TAG);
        assert!(matches!(
            actual_lrp_key_from_tags(Some(&tags)),
            Err(LrpKeyError::InvalidProcessIndex(_))
        ));
    }

    #[test]
    fn negative_index_is_rejected() {
        let mut tags = lrp_tags();
        tags.insert(PROCESS_INDEX_TAG.to_string(), "-1".to_string());
        assert!(matches!(
            actual_lrp_key_from_tags(Some(&tags)),
            Err(LrpKeyError::InvalidProcessIndex(_))
        ));
    }

    #[test]
    fn empty_process_guid_or_domain_is_rejected() {
        let mut tags = lrp_tags();
        tags.remove(PROCESS_GUID_TAG);
        assert_eq!(
            actual_lrp_key_from_tags(Some(&tags)),
            Err(LrpKeyError::MissingField("process_guid"))
        );

        let mut tags = lrp_tags();
        tags.insert(DOMAIN_TAG.to_string(), String::new());
        assert_eq!(
            actual_lrp_key_from_tags(Some(&tags)),
            Err(LrpKeyError::MissingField("domain"))
        );
    }

    #[test]
    fn extracts_instance_key() {
        let key = actual_lrp_instance_key_from_tags(Some(&lrp_tags()), "cell-1").unwrap();
        assert_eq!(key, ActualLrpInstanceKey::new("ig-1", "cell-1"));
    }

    #[test]
    fn instance_key_requires_guid_and_cell() {
        let mut tags = lrp_tags();
        assert_eq!(
            actual_lrp_instance_key_from_tags(Some(&tags), ""),
            Err(LrpKeyError::MissingField("cell_id"))
        );

        tags.remove(INSTANCE_GUID_TAG);
        assert_eq!(
            actual_lrp_instance_key_from_tags(Some(&tags), "cell-1"),
            Err(LrpKeyError::MissingField("instance_guid"))
        );
    }
}
