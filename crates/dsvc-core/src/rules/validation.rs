use std::collections::BTreeMap;

use crate::errors::VersioningError;
use crate::model::{DRAFT_REF, LATEST_TAG};

pub const MAX_TAG_LEN: usize = 100;
pub const MAX_CHANGE_DESCRIPTION_LEN: usize = 2000;
pub const MAX_METADATA_KEY_LEN: usize = 100;
pub const MAX_METADATA_VALUE_LEN: usize = 1000;
pub const MAX_DATASET_NAME_LEN: usize = 150;

type Result<T> = std::result::Result<T, VersioningError>;

/// Validate the shape of a tag name (length, whitespace, control characters).
///
/// Does not check reservation; see [`validate_user_tag`].
///
/// # Errors
/// `InvalidTagName` when the name is empty, too long, padded with
/// whitespace, or contains control characters.
pub fn validate_tag_name(tag: &str) -> Result<()> {
    let invalid = |reason: &str| VersioningError::InvalidTagName {
        tag: tag.to_string(),
        reason: reason.to_string(),
    };

    if tag.trim().is_empty() {
        return Err(invalid("tag must not be blank"));
    }
    if tag.chars().count() > MAX_TAG_LEN {
        return Err(invalid(&format!(
            "tag must be at most {} characters",
            MAX_TAG_LEN
        )));
    }
    if tag.trim() != tag {
        return Err(invalid("tag must not start or end with whitespace"));
    }
    if tag.chars().any(char::is_control) {
        return Err(invalid("tag must not contain control characters"));
    }
    Ok(())
}

/// Validate a tag that a user asks to create.
///
/// `latest` is owned by the commit path and `draft` would be shadowed by the
/// draft sentinel during resolution, so neither can be created by hand.
///
/// # Errors
/// `ReservedTagName` for `latest`/`draft`, otherwise as [`validate_tag_name`].
pub fn validate_user_tag(tag: &str) -> Result<()> {
    validate_tag_name(tag)?;
    if tag == LATEST_TAG || tag == DRAFT_REF {
        return Err(VersioningError::ReservedTagName {
            tag: tag.to_string(),
        });
    }
    Ok(())
}

/// # Errors
/// `InvalidInput` when the description exceeds the length limit.
pub fn validate_change_description(description: Option<&str>) -> Result<()> {
    match description {
        Some(d) if d.chars().count() > MAX_CHANGE_DESCRIPTION_LEN => {
            Err(VersioningError::InvalidInput {
                reason: format!(
                    "change description must be at most {} characters",
                    MAX_CHANGE_DESCRIPTION_LEN
                ),
            })
        }
        _ => Ok(()),
    }
}

/// # Errors
/// `InvalidInput` for blank or oversized keys and oversized values.
pub fn validate_metadata(metadata: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in metadata {
        if key.trim().is_empty() || key.chars().count() > MAX_METADATA_KEY_LEN {
            return Err(VersioningError::InvalidInput {
                reason: format!(
                    "metadata key '{}' must be 1..={} non-blank characters",
                    key, MAX_METADATA_KEY_LEN
                ),
            });
        }
        if value.chars().count() > MAX_METADATA_VALUE_LEN {
            return Err(VersioningError::InvalidInput {
                reason: format!(
                    "metadata value for '{}' must be at most {} characters",
                    key, MAX_METADATA_VALUE_LEN
                ),
            });
        }
    }
    Ok(())
}

/// # Errors
/// `InvalidInput` for blank or oversized dataset names.
pub fn validate_dataset_name(name: &str) -> Result<()> {
    if name.trim().is_empty() || name.chars().count() > MAX_DATASET_NAME_LEN {
        return Err(VersioningError::InvalidInput {
            reason: format!(
                "dataset name must be 1..={} non-blank characters",
                MAX_DATASET_NAME_LEN
            ),
        });
    }
    Ok(())
}

/// Validate a 1-based page request against the configured maximum size.
///
/// # Errors
/// `InvalidPage` when `page` is zero or `size` is outside `1..=max_size`.
pub fn validate_page(page: u32, size: u32, max_size: u32) -> Result<()> {
    if page == 0 {
        return Err(VersioningError::InvalidPage {
            reason: "page numbers start at 1".to_string(),
        });
    }
    if size == 0 || size > max_size {
        return Err(VersioningError::InvalidPage {
            reason: format!("size must be between 1 and {}", max_size),
        });
    }
    Ok(())
}
