//! Draft item CRUD and paginated item reads for any reference.
//!
//! Draft writes carry no versioning logic; they only shape what the next
//! commit will snapshot.

use chrono::Utc;
use dsvc_core::config::PagingConfig;
use dsvc_core::errors::ExError;
use dsvc_core::model::{DraftItem, NewDraftItem, Page, VersionedItem};
use dsvc_core::reference::{ResolvedRef, VersionRef};
use dsvc_core::{log_op_end, log_op_error, log_op_start};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::{persistence, Result};
use dsvc_store::repo::{draft_items, versions};
use rusqlite::Connection;
use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

use super::resolve::resolve_reference;
use super::{annotate, elapsed_ms, require_dataset, PageRequest};

/// A page of items from either side of the draft/version split.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ItemsPage {
    Draft {
        page: Page<DraftItem>,
    },
    Version {
        version_hash: String,
        page: Page<VersionedItem>,
    },
}

impl ItemsPage {
    pub fn total(&self) -> u64 {
        match self {
            ItemsPage::Draft { page } => page.total,
            ItemsPage::Version { page, .. } => page.total,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ItemsPage::Draft { page } => page.content.len(),
            ItemsPage::Version { page, .. } => page.content.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Insert or replace draft items in one transaction.
///
/// Items without an id get a fresh UUID v7.
///
/// # Errors
/// - `NotFound`: unknown dataset
/// - `Conflict`: an id belongs to another dataset (nothing is written)
pub fn upsert_draft_items(
    ctx: &CallerContext,
    dataset_id: &str,
    items: &[NewDraftItem],
    conn: &mut Connection,
) -> Result<Vec<DraftItem>> {
    const OP: &str = "upsert_draft_items";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, count = items.len());

    let result = (|| {
        require_dataset(conn, ctx, dataset_id)?;
        let tx = conn.transaction().map_err(|e| persistence(OP, e))?;
        let now = Utc::now();
        let written = items
            .iter()
            .map(|item| {
                let id = item
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::now_v7().to_string());
                draft_items::upsert_draft_item(&tx, dataset_id, &id, &item.data, now)
            })
            .collect::<Result<Vec<_>>>()?;
        tx.commit().map_err(|e| persistence(OP, e))?;
        Ok::<Vec<DraftItem>, ExError>(written)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(written) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            count = written.len()
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// Delete draft items by id. Unknown ids are ignored.
///
/// Returns how many items were removed.
pub fn delete_draft_items(
    ctx: &CallerContext,
    dataset_id: &str,
    ids: &[String],
    conn: &mut Connection,
) -> Result<u64> {
    const OP: &str = "delete_draft_items";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, count = ids.len());

    let result = (|| {
        require_dataset(conn, ctx, dataset_id)?;
        let tx = conn.transaction().map_err(|e| persistence(OP, e))?;
        let mut removed = 0u64;
        for id in ids {
            if draft_items::delete_draft_item(&tx, dataset_id, id)? {
                removed += 1;
            }
        }
        tx.commit().map_err(|e| persistence(OP, e))?;
        Ok::<u64, ExError>(removed)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(removed) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            removed = *removed
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// The whole draft, ordered by id.
pub fn list_draft_items(
    ctx: &CallerContext,
    dataset_id: &str,
    conn: &Connection,
) -> Result<Vec<DraftItem>> {
    const OP: &str = "list_draft_items";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id);

    let result = require_dataset(conn, ctx, dataset_id)
        .and_then(|_| draft_items::list_draft_items(conn, dataset_id));

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(items) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            count = items.len()
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// One page of the items behind `reference` (draft when `None`).
///
/// Both collections are ordered by item id, so walking the pages of an
/// unchanging collection visits every item exactly once.
///
/// # Errors
/// - `Validation`: malformed reference or out-of-range page
/// - `NotFound`: unknown dataset or reference
pub fn get_items(
    ctx: &CallerContext,
    dataset_id: &str,
    reference: Option<&str>,
    page: PageRequest,
    paging: &PagingConfig,
    conn: &mut Connection,
) -> Result<ItemsPage> {
    const OP: &str = "get_items";
    let start = Instant::now();
    log_op_start!(
        OP,
        dataset_id = dataset_id,
        reference = reference.unwrap_or("draft")
    );

    let result = (|| {
        let parsed = VersionRef::parse(reference)?;
        let (page, size) = page.resolve(paging)?;
        require_dataset(conn, ctx, dataset_id)?;

        // Count and page rows from one read snapshot
        let tx = conn.transaction().map_err(|e| persistence(OP, e))?;
        let items = match resolve_reference(&tx, dataset_id, &parsed)? {
            ResolvedRef::Draft => ItemsPage::Draft {
                page: draft_items::page_draft_items(&tx, dataset_id, page, size)?,
            },
            ResolvedRef::Version { version, .. } => ItemsPage::Version {
                page: versions::page_version_items(&tx, &version.version_hash, page, size)?,
                version_hash: version.version_hash,
            },
        };
        tx.commit().map_err(|e| persistence(OP, e))?;
        Ok::<ItemsPage, ExError>(items)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(items) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            count = items.len(),
            total = items.total()
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}
