//! Compare two references of one dataset.

use dsvc_core::diff::{compute_item_diff, render_comparison_summary, LineageItem, SideLabel};
use dsvc_core::diff::{DiffStatistics, ItemDiff, LineageEntry};
use dsvc_core::model::{DraftItem, VersionedItem};
use dsvc_core::reference::{ResolvedRef, VersionRef};
use dsvc_core::{log_op_end, log_op_error, log_op_start};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::{persistence, Result};
use dsvc_store::repo::{draft_items, versions};
use rusqlite::Connection;
use serde::Serialize;
use std::time::Instant;

use super::resolve::resolve_reference;
use super::{annotate, elapsed_ms, require_dataset};

/// Outcome of [`compare_versions`]. Either side may be the draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub from_label: String,
    pub to_label: String,
    /// `None` when the side is the draft
    pub from_version_hash: Option<String>,
    pub to_version_hash: Option<String>,
    pub statistics: DiffStatistics,
    pub diff: ItemDiff,
}

impl ComparisonResult {
    /// Markdown rendering for humans
    pub fn summary(&self) -> String {
        render_comparison_summary(
            SideLabel {
                label: &self.from_label,
                version_hash: self.from_version_hash.as_deref(),
            },
            SideLabel {
                label: &self.to_label,
                version_hash: self.to_version_hash.as_deref(),
            },
            &self.diff,
        )
    }
}

/// Items loaded for one side of a comparison.
enum SideItems {
    Draft(Vec<DraftItem>),
    Version(Vec<VersionedItem>),
}

fn load_side(conn: &Connection, dataset_id: &str, side: &ResolvedRef) -> Result<SideItems> {
    match side.version_hash() {
        None => Ok(SideItems::Draft(draft_items::list_draft_items(
            conn, dataset_id,
        )?)),
        Some(hash) => Ok(SideItems::Version(versions::list_version_items(conn, hash)?)),
    }
}

impl SideItems {
    fn entries(&self) -> Vec<LineageEntry<'_>> {
        match self {
            SideItems::Draft(items) => items.iter().map(LineageItem::lineage_entry).collect(),
            SideItems::Version(items) => items.iter().map(LineageItem::lineage_entry).collect(),
        }
    }
}

/// Diff `from` (older side) against `to` (newer side).
///
/// `to` defaults to the draft; `from` is required by callers but a `None`
/// also means the draft. Items are matched by lineage, so a draft item and
/// its snapshot in any version compare as the same item.
///
/// # Errors
/// - `Validation`: malformed reference
/// - `NotFound`: unknown dataset or reference
pub fn compare_versions(
    ctx: &CallerContext,
    dataset_id: &str,
    from: Option<&str>,
    to: Option<&str>,
    conn: &mut Connection,
) -> Result<ComparisonResult> {
    const OP: &str = "compare_versions";
    let start = Instant::now();
    log_op_start!(
        OP,
        dataset_id = dataset_id,
        from = from.unwrap_or("draft"),
        to = to.unwrap_or("draft")
    );

    let result = (|| -> Result<ComparisonResult> {
        let from_ref = VersionRef::parse(from)?;
        let to_ref = VersionRef::parse(to)?;
        require_dataset(conn, ctx, dataset_id)?;

        // Both sides come from one read snapshot
        let tx = conn.transaction().map_err(|e| persistence(OP, e))?;
        let from_side = resolve_reference(&tx, dataset_id, &from_ref)?;
        let to_side = resolve_reference(&tx, dataset_id, &to_ref)?;
        let from_items = load_side(&tx, dataset_id, &from_side)?;
        let to_items = load_side(&tx, dataset_id, &to_side)?;
        tx.commit().map_err(|e| persistence(OP, e))?;

        let diff = compute_item_diff(from_items.entries(), to_items.entries())?;
        Ok(ComparisonResult {
            from_label: from_side.label().to_string(),
            to_label: to_side.label().to_string(),
            from_version_hash: from_side.version_hash().map(str::to_string),
            to_version_hash: to_side.version_hash().map(str::to_string),
            statistics: diff.statistics(),
            diff,
        })
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(cmp) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            items_added = cmp.statistics.items_added,
            items_modified = cmp.statistics.items_modified,
            items_deleted = cmp.statistics.items_deleted,
            items_unchanged = cmp.statistics.items_unchanged
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}
