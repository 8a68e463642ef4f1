//! Restore: make the draft equal to a committed version.
//!
//! The draft is rewritten so that its item ids are the version's lineage
//! ids. Restore itself creates no version and moves no tag; the next commit
//! records the result.

use dsvc_core::model::DatasetVersion;
use dsvc_core::{log_op_end, log_op_error, log_op_start};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::{persistence, Result};
use dsvc_store::repo::draft_items;
use rusqlite::{Connection, TransactionBehavior};
use std::time::Instant;

use super::resolve::resolve_committed;
use super::{annotate, elapsed_ms, require_dataset};

/// Replace the draft with the items of the version named by `reference`.
///
/// Returns the restored version.
///
/// # Errors
/// - `Validation`: malformed reference or `draft`
/// - `NotFound`: unknown dataset or reference
/// - `Conflict`: a lineage id of the version is now a draft item of another dataset; nothing changes
pub fn restore_version(
    ctx: &CallerContext,
    dataset_id: &str,
    reference: &str,
    conn: &mut Connection,
) -> Result<DatasetVersion> {
    const OP: &str = "restore_version";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, reference = reference);

    let result = (|| -> Result<(DatasetVersion, draft_items::DraftReplaceCounts)> {
        require_dataset(conn, ctx, dataset_id)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| persistence(OP, e))?;
        let version = resolve_committed(&tx, dataset_id, reference, OP)?;
        let counts = draft_items::replace_draft_with_version(
            &tx,
            dataset_id,
            &version.version_hash,
            chrono::Utc::now(),
        )?;
        tx.commit().map_err(|e| persistence(OP, e))?;
        Ok((version, counts))
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok((version, counts)) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            version_hash = version.version_hash.as_str(),
            written = counts.written,
            removed = counts.removed
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result
        .map(|(version, _)| version)
        .map_err(|e| annotate(e, OP, ctx))
}
