//! Draft item rows: the mutable working copy of a dataset.

use chrono::{DateTime, Utc};
use dsvc_core::errors::{ExError, ExErrorKind};
use dsvc_core::model::{DraftItem, ItemData, Page};
use rusqlite::{Connection, OptionalExtension, Row};

use super::{count_column, json_column, sql_int, time_column, to_millis};
use crate::errors::{persistence, Result};

const ITEM_COLUMNS: &str = "id, dataset_id, data, created_at, last_updated_at";

fn row_to_draft_item(row: &Row<'_>) -> rusqlite::Result<DraftItem> {
    Ok(DraftItem {
        id: row.get(0)?,
        dataset_id: row.get(1)?,
        data: json_column(row, 2)?,
        created_at: time_column(row, 3)?,
        last_updated_at: time_column(row, 4)?,
    })
}

fn encode_data(op: &str, data: &ItemData) -> Result<String> {
    serde_json::to_string(data).map_err(|e| ExError::from(e).with_op(op.to_string()))
}

/// Insert an item, or replace the data of an existing item with the same id.
///
/// `created_at` of an existing item is kept.
///
/// # Errors
/// - `Conflict`: `id` already belongs to another dataset
/// - `Persistence`: SQLite write failed
pub fn upsert_draft_item(
    conn: &Connection,
    dataset_id: &str,
    id: &str,
    data: &ItemData,
    now: DateTime<Utc>,
) -> Result<DraftItem> {
    let encoded = encode_data("upsert_draft_item", data)?;
    let now_ms = to_millis(&now);

    conn.execute(
        "INSERT INTO dataset_items (id, dataset_id, data, created_at, last_updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(id) DO UPDATE SET
            data = excluded.data,
            last_updated_at = excluded.last_updated_at
         WHERE dataset_items.dataset_id = excluded.dataset_id",
        rusqlite::params![id, dataset_id, encoded, now_ms],
    )
    .map_err(|e| persistence("upsert_draft_item", e))?;

    get_draft_item(conn, dataset_id, id)?.ok_or_else(|| {
        ExError::new(ExErrorKind::Conflict)
            .with_op("upsert_draft_item")
            .with_dataset_id(dataset_id)
            .with_message(format!("item id {} belongs to another dataset", id))
    })
}

/// Delete one draft item. Returns whether a row was removed.
pub fn delete_draft_item(conn: &Connection, dataset_id: &str, id: &str) -> Result<bool> {
    let removed = conn
        .execute(
            "DELETE FROM dataset_items WHERE dataset_id = ?1 AND id = ?2",
            [dataset_id, id],
        )
        .map_err(|e| persistence("delete_draft_item", e))?;
    Ok(removed > 0)
}

pub fn get_draft_item(conn: &Connection, dataset_id: &str, id: &str) -> Result<Option<DraftItem>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM dataset_items WHERE dataset_id = ?1 AND id = ?2",
            ITEM_COLUMNS
        ),
        [dataset_id, id],
        row_to_draft_item,
    )
    .optional()
    .map_err(|e| persistence("get_draft_item", e))
}

/// The whole draft collection, ordered by id.
pub fn list_draft_items(conn: &Connection, dataset_id: &str) -> Result<Vec<DraftItem>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM dataset_items WHERE dataset_id = ?1 ORDER BY id",
            ITEM_COLUMNS
        ))
        .map_err(|e| persistence("list_draft_items", e))?;

    let items = stmt
        .query_map([dataset_id], row_to_draft_item)
        .map_err(|e| persistence("list_draft_items", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence("list_draft_items", e))?;

    Ok(items)
}

pub fn count_draft_items(conn: &Connection, dataset_id: &str) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM dataset_items WHERE dataset_id = ?1",
        [dataset_id],
        |row| count_column(row, 0),
    )
    .map_err(|e| persistence("count_draft_items", e))
}

/// One page of the draft, ordered by id. `page` is 1-based.
pub fn page_draft_items(
    conn: &Connection,
    dataset_id: &str,
    page: u32,
    size: u32,
) -> Result<Page<DraftItem>> {
    let total = count_draft_items(conn, dataset_id)?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM dataset_items WHERE dataset_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3",
            ITEM_COLUMNS
        ))
        .map_err(|e| persistence("page_draft_items", e))?;

    let content = stmt
        .query_map(
            rusqlite::params![
                dataset_id,
                i64::from(size),
                sql_int(Page::<DraftItem>::offset(page, size))
            ],
            row_to_draft_item,
        )
        .map_err(|e| persistence("page_draft_items", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence("page_draft_items", e))?;

    Ok(Page {
        page,
        size,
        total,
        content,
    })
}

/// Counts reported by [`replace_draft_with_version`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DraftReplaceCounts {
    /// Draft items inserted or whose data changed
    pub written: u64,
    /// Draft items removed because the version does not contain them
    pub removed: u64,
}

/// Make the draft equal to a version's items.
///
/// Each versioned item becomes the draft item named by its lineage
/// (`draft_item_id`), so diffs against that version line up again. Draft
/// items absent from the version are deleted; items whose data already
/// matches are left untouched, keeping their `last_updated_at`.
///
/// Nothing is written when a lineage id is held by another dataset's draft;
/// the caller's transaction must be rolled back on error.
///
/// # Errors
/// - `Conflict`: a lineage id of the version belongs to another dataset
/// - `Persistence`: SQLite read or write failed
pub fn replace_draft_with_version(
    conn: &Connection,
    dataset_id: &str,
    version_hash: &str,
    now: DateTime<Utc>,
) -> Result<DraftReplaceCounts> {
    let taken: Option<String> = conn
        .query_row(
            "SELECT d.id FROM dataset_items d
             JOIN dataset_version_items v ON v.draft_item_id = d.id
             WHERE v.version_hash = ?2 AND d.dataset_id != ?1
             ORDER BY d.id LIMIT 1",
            [dataset_id, version_hash],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| persistence("replace_draft_with_version", e))?;
    if let Some(id) = taken {
        return Err(ExError::new(ExErrorKind::Conflict)
            .with_op("replace_draft_with_version")
            .with_dataset_id(dataset_id)
            .with_version_ref(version_hash)
            .with_message(format!("item id {} belongs to another dataset", id)));
    }

    let removed = conn
        .execute(
            "DELETE FROM dataset_items
             WHERE dataset_id = ?1
               AND id NOT IN (
                   SELECT draft_item_id FROM dataset_version_items WHERE version_hash = ?2
               )",
            [dataset_id, version_hash],
        )
        .map_err(|e| persistence("replace_draft_with_version", e))?;

    // `WHERE true` keeps the upsert clause from parsing as a join constraint
    let written = conn
        .execute(
            "INSERT INTO dataset_items (id, dataset_id, data, created_at, last_updated_at)
             SELECT draft_item_id, ?1, data, ?3, ?3
             FROM dataset_version_items
             WHERE version_hash = ?2 AND true
             ON CONFLICT(id) DO UPDATE SET
                data = excluded.data,
                last_updated_at = excluded.last_updated_at
             WHERE dataset_items.data IS NOT excluded.data
               AND dataset_items.dataset_id = excluded.dataset_id",
            rusqlite::params![dataset_id, version_hash, to_millis(&now)],
        )
        .map_err(|e| persistence("replace_draft_with_version", e))?;

    Ok(DraftReplaceCounts {
        written: written as u64,
        removed: removed as u64,
    })
}
