//! Version rows and their frozen item snapshots.
//!
//! Nothing here updates a version's content: only the descriptive fields
//! and the last-updated audit columns can change after insert.

use chrono::{DateTime, Utc};
use dsvc_core::errors::ExError;
use dsvc_core::model::{DatasetVersion, Page, VersionStatistics, VersionedItem};
use rusqlite::{Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

use super::{count_column, json_column, sql_int, tags::tags_for_version, time_column, to_millis};
use crate::errors::{persistence, Result};

const VERSION_COLUMNS: &str = "version_hash, dataset_id, sequence, created_at, created_by, \
     change_description, metadata, items_total, items_added, items_modified, items_deleted, \
     last_updated_at, last_updated_by";

const VERSION_ITEM_COLUMNS: &str =
    "id, version_hash, dataset_id, draft_item_id, data, created_at";

/// Map a version row; tags are attached separately.
fn row_to_version(row: &Row<'_>) -> rusqlite::Result<DatasetVersion> {
    Ok(DatasetVersion {
        version_hash: row.get(0)?,
        dataset_id: row.get(1)?,
        sequence: count_column(row, 2)?,
        created_at: time_column(row, 3)?,
        created_by: row.get(4)?,
        change_description: row.get(5)?,
        metadata: json_column(row, 6)?,
        statistics: VersionStatistics {
            items_total: count_column(row, 7)?,
            items_added: count_column(row, 8)?,
            items_modified: count_column(row, 9)?,
            items_deleted: count_column(row, 10)?,
        },
        tags: Default::default(),
        last_updated_at: time_column(row, 11)?,
        last_updated_by: row.get(12)?,
    })
}

fn row_to_version_item(row: &Row<'_>) -> rusqlite::Result<VersionedItem> {
    Ok(VersionedItem {
        id: row.get(0)?,
        version_hash: row.get(1)?,
        dataset_id: row.get(2)?,
        draft_item_id: row.get(3)?,
        data: json_column(row, 4)?,
        created_at: time_column(row, 5)?,
    })
}

fn with_tags(conn: &Connection, mut version: DatasetVersion) -> Result<DatasetVersion> {
    version.tags = tags_for_version(conn, &version.version_hash)?;
    Ok(version)
}

/// Sequence number the next commit on this dataset will take.
pub fn next_sequence(conn: &Connection, dataset_id: &str) -> Result<u64> {
    conn.query_row(
        "SELECT COALESCE(MAX(sequence), 0) + 1 FROM dataset_versions WHERE dataset_id = ?1",
        [dataset_id],
        |row| count_column(row, 0),
    )
    .map_err(|e| persistence("next_sequence", e))
}

/// Insert the version row. Tags in `version.tags` are not written here.
pub fn insert_version(conn: &Connection, version: &DatasetVersion) -> Result<()> {
    let metadata = serde_json::to_string(&version.metadata)
        .map_err(|e| ExError::from(e).with_op("insert_version"))?;

    conn.execute(
        "INSERT INTO dataset_versions (
            version_hash, dataset_id, sequence, created_at, created_by,
            change_description, metadata, items_total, items_added, items_modified,
            items_deleted, last_updated_at, last_updated_by
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        rusqlite::params![
            version.version_hash,
            version.dataset_id,
            sql_int(version.sequence),
            to_millis(&version.created_at),
            version.created_by,
            version.change_description,
            metadata,
            sql_int(version.statistics.items_total),
            sql_int(version.statistics.items_added),
            sql_int(version.statistics.items_modified),
            sql_int(version.statistics.items_deleted),
            to_millis(&version.last_updated_at),
            version.last_updated_by,
        ],
    )
    .map_err(|e| persistence("insert_version", e))?;

    Ok(())
}

/// Insert the frozen item rows of one version.
pub fn insert_version_items(conn: &Connection, items: &[VersionedItem]) -> Result<()> {
    let mut stmt = conn
        .prepare(
            "INSERT INTO dataset_version_items
                (id, version_hash, dataset_id, draft_item_id, data, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(|e| persistence("insert_version_items", e))?;

    for item in items {
        let data = serde_json::to_string(&item.data)
            .map_err(|e| ExError::from(e).with_op("insert_version_items"))?;
        stmt.execute(rusqlite::params![
            item.id,
            item.version_hash,
            item.dataset_id,
            item.draft_item_id,
            data,
            to_millis(&item.created_at),
        ])
        .map_err(|e| persistence("insert_version_items", e))?;
    }

    Ok(())
}

/// Fetch a version of `dataset_id` by hash, with its tags.
pub fn get_version(
    conn: &Connection,
    dataset_id: &str,
    version_hash: &str,
) -> Result<Option<DatasetVersion>> {
    let version = conn
        .query_row(
            &format!(
                "SELECT {} FROM dataset_versions WHERE dataset_id = ?1 AND version_hash = ?2",
                VERSION_COLUMNS
            ),
            [dataset_id, version_hash],
            row_to_version,
        )
        .optional()
        .map_err(|e| persistence("get_version", e))?;

    version.map(|v| with_tags(conn, v)).transpose()
}

pub fn count_versions(conn: &Connection, dataset_id: &str) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM dataset_versions WHERE dataset_id = ?1",
        [dataset_id],
        |row| count_column(row, 0),
    )
    .map_err(|e| persistence("count_versions", e))
}

/// One page of versions, newest first. `page` is 1-based.
pub fn page_versions(
    conn: &Connection,
    dataset_id: &str,
    page: u32,
    size: u32,
) -> Result<Page<DatasetVersion>> {
    let total = count_versions(conn, dataset_id)?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM dataset_versions WHERE dataset_id = ?1
             ORDER BY sequence DESC LIMIT ?2 OFFSET ?3",
            VERSION_COLUMNS
        ))
        .map_err(|e| persistence("page_versions", e))?;

    let rows = stmt
        .query_map(
            rusqlite::params![
                dataset_id,
                i64::from(size),
                sql_int(Page::<DatasetVersion>::offset(page, size))
            ],
            row_to_version,
        )
        .map_err(|e| persistence("page_versions", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence("page_versions", e))?;

    let content = rows
        .into_iter()
        .map(|v| with_tags(conn, v))
        .collect::<Result<Vec<_>>>()?;

    Ok(Page {
        page,
        size,
        total,
        content,
    })
}

/// Every frozen item of a version, ordered by id.
pub fn list_version_items(conn: &Connection, version_hash: &str) -> Result<Vec<VersionedItem>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM dataset_version_items WHERE version_hash = ?1 ORDER BY id",
            VERSION_ITEM_COLUMNS
        ))
        .map_err(|e| persistence("list_version_items", e))?;

    let items = stmt
        .query_map([version_hash], row_to_version_item)
        .map_err(|e| persistence("list_version_items", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence("list_version_items", e))?;

    Ok(items)
}

/// One page of a version's items, ordered by id. `page` is 1-based.
pub fn page_version_items(
    conn: &Connection,
    version_hash: &str,
    page: u32,
    size: u32,
) -> Result<Page<VersionedItem>> {
    let total = conn
        .query_row(
            "SELECT COUNT(*) FROM dataset_version_items WHERE version_hash = ?1",
            [version_hash],
            |row| count_column(row, 0),
        )
        .map_err(|e| persistence("page_version_items", e))?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM dataset_version_items WHERE version_hash = ?1
             ORDER BY id LIMIT ?2 OFFSET ?3",
            VERSION_ITEM_COLUMNS
        ))
        .map_err(|e| persistence("page_version_items", e))?;

    let content = stmt
        .query_map(
            rusqlite::params![
                version_hash,
                i64::from(size),
                sql_int(Page::<VersionedItem>::offset(page, size))
            ],
            row_to_version_item,
        )
        .map_err(|e| persistence("page_version_items", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence("page_version_items", e))?;

    Ok(Page {
        page,
        size,
        total,
        content,
    })
}

/// Descriptive fields an update may change; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct VersionInfoUpdate<'a> {
    pub change_description: Option<&'a str>,
    pub metadata: Option<&'a BTreeMap<String, String>>,
}

/// Apply a descriptive update and stamp the audit columns.
///
/// Returns whether a row matched.
pub fn update_version_info(
    conn: &Connection,
    dataset_id: &str,
    version_hash: &str,
    update: &VersionInfoUpdate<'_>,
    updated_at: DateTime<Utc>,
    updated_by: &str,
) -> Result<bool> {
    let metadata = update
        .metadata
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| ExError::from(e).with_op("update_version_info"))?;

    let changed = conn
        .execute(
            "UPDATE dataset_versions SET
                change_description = COALESCE(?3, change_description),
                metadata = COALESCE(?4, metadata),
                last_updated_at = ?5,
                last_updated_by = ?6
             WHERE dataset_id = ?1 AND version_hash = ?2",
            rusqlite::params![
                dataset_id,
                version_hash,
                update.change_description,
                metadata,
                to_millis(&updated_at),
                updated_by,
            ],
        )
        .map_err(|e| persistence("update_version_info", e))?;

    Ok(changed > 0)
}
