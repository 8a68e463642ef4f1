//! Tag rows: `(dataset_id, tag) → version_hash`.

use dsvc_core::errors::{ExError, VersioningError};
use dsvc_core::model::{DatasetVersionTag, LATEST_TAG};
use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeSet;

use super::to_millis;
use crate::errors::{is_unique_violation, persistence, Result};

/// Version hash a tag points at, if the tag exists in the dataset.
pub fn find_tag(conn: &Connection, dataset_id: &str, tag: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT version_hash FROM dataset_version_tags WHERE dataset_id = ?1 AND tag = ?2",
        [dataset_id, tag],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| persistence("find_tag", e))
}

/// Insert a tag.
///
/// # Errors
/// - `Conflict`: the tag already exists in this dataset (on any version)
/// - `Persistence`: SQLite write failed
pub fn insert_tag(conn: &Connection, tag: &DatasetVersionTag) -> Result<()> {
    conn.execute(
        "INSERT INTO dataset_version_tags (dataset_id, tag, version_hash, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            tag.dataset_id,
            tag.tag,
            tag.version_hash,
            to_millis(&tag.created_at),
            tag.created_by,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            ExError::from(VersioningError::TagAlreadyExists {
                dataset_id: tag.dataset_id.clone(),
                tag: tag.tag.clone(),
            })
            .with_op("insert_tag")
        } else {
            persistence("insert_tag", e)
        }
    })?;

    Ok(())
}

/// Point `latest` at `tag.version_hash`, replacing any previous placement.
pub fn move_latest(conn: &Connection, tag: &DatasetVersionTag) -> Result<()> {
    conn.execute(
        "DELETE FROM dataset_version_tags WHERE dataset_id = ?1 AND tag = ?2",
        [tag.dataset_id.as_str(), LATEST_TAG],
    )
    .map_err(|e| persistence("move_latest", e))?;

    conn.execute(
        "INSERT INTO dataset_version_tags (dataset_id, tag, version_hash, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            tag.dataset_id,
            LATEST_TAG,
            tag.version_hash,
            to_millis(&tag.created_at),
            tag.created_by,
        ],
    )
    .map_err(|e| persistence("move_latest", e))?;

    Ok(())
}

/// Remove `tag` if it currently points at `version_hash`.
///
/// Returns whether a row was removed.
pub fn delete_tag(
    conn: &Connection,
    dataset_id: &str,
    tag: &str,
    version_hash: &str,
) -> Result<bool> {
    let removed = conn
        .execute(
            "DELETE FROM dataset_version_tags
             WHERE dataset_id = ?1 AND tag = ?2 AND version_hash = ?3",
            [dataset_id, tag, version_hash],
        )
        .map_err(|e| persistence("delete_tag", e))?;
    Ok(removed > 0)
}

/// All tags currently on a version.
pub fn tags_for_version(conn: &Connection, version_hash: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare("SELECT tag FROM dataset_version_tags WHERE version_hash = ?1")
        .map_err(|e| persistence("tags_for_version", e))?;

    let tags = stmt
        .query_map([version_hash], |row| row.get(0))
        .map_err(|e| persistence("tags_for_version", e))?
        .collect::<std::result::Result<BTreeSet<String>, _>>()
        .map_err(|e| persistence("tags_for_version", e))?;

    Ok(tags)
}

/// Number of rows for `tag` in the dataset (0 or 1 by the primary key)
pub fn count_tag(conn: &Connection, dataset_id: &str, tag: &str) -> Result<u64> {
    let n: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM dataset_version_tags WHERE dataset_id = ?1 AND tag = ?2",
            [dataset_id, tag],
            |row| row.get(0),
        )
        .map_err(|e| persistence("count_tag", e))?;
    Ok(n.max(0) as u64)
}
