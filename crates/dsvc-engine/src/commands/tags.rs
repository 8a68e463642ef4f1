//! Tag registry operations.
//!
//! `latest` is owned by the commit path: it can be neither created nor
//! deleted here.

use chrono::Utc;
use dsvc_core::errors::VersioningError;
use dsvc_core::model::{DatasetVersionTag, LATEST_TAG};
use dsvc_core::rules::{validate_tag_name, validate_user_tag};
use dsvc_core::{log_op_end, log_op_error, log_op_start};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::{persistence, Result};
use dsvc_store::repo::{tags, versions};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::BTreeSet;
use std::time::Instant;

use super::resolve::resolve_committed;
use super::{annotate, elapsed_ms, require_dataset};

/// Tag the version named by `version_ref` (a hash or an existing tag).
///
/// # Errors
/// - `Validation`: reserved/malformed tag, malformed or draft reference
/// - `NotFound`: unknown dataset or version
/// - `Conflict`: the tag already exists in this dataset
pub fn create_tag(
    ctx: &CallerContext,
    dataset_id: &str,
    version_ref: &str,
    tag: &str,
    conn: &mut Connection,
) -> Result<DatasetVersionTag> {
    const OP: &str = "create_tag";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, tag = tag);

    let result = (|| -> Result<DatasetVersionTag> {
        validate_user_tag(tag)?;
        require_dataset(conn, ctx, dataset_id)?;

        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| persistence(OP, e))?;
        let version = resolve_committed(&tx, dataset_id, version_ref, OP)?;
        let row = DatasetVersionTag {
            dataset_id: dataset_id.to_string(),
            tag: tag.to_string(),
            version_hash: version.version_hash,
            created_at: Utc::now(),
            created_by: ctx.user_name.clone(),
        };
        tags::insert_tag(&tx, &row)?;
        tx.commit().map_err(|e| persistence(OP, e))?;
        Ok(row)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(row) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            tag = tag,
            version_hash = row.version_hash.as_str()
        ),
        Err(e) => log_op_error!(
            OP,
            *e,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            tag = tag
        ),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// Remove `tag` from `version_hash`.
///
/// Succeeds without change when the tag is absent or points at a different
/// version. Returns whether a tag was removed.
///
/// # Errors
/// - `Validation`: `tag` is `latest` or malformed
/// - `NotFound`: unknown dataset
pub fn delete_tag(
    ctx: &CallerContext,
    dataset_id: &str,
    version_hash: &str,
    tag: &str,
    conn: &Connection,
) -> Result<bool> {
    const OP: &str = "delete_tag";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, tag = tag);

    let result = (|| -> Result<bool> {
        if tag == LATEST_TAG {
            return Err(VersioningError::LatestTagProtected {
                dataset_id: dataset_id.to_string(),
            }
            .into());
        }
        validate_tag_name(tag)?;
        require_dataset(conn, ctx, dataset_id)?;
        tags::delete_tag(conn, dataset_id, tag, version_hash)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(removed) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            tag = tag,
            removed = *removed
        ),
        Err(e) => log_op_error!(
            OP,
            *e,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            tag = tag
        ),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// Tags attached to one version of the dataset, sorted.
///
/// # Errors
/// - `NotFound`: unknown dataset or version hash
pub fn list_tags(
    ctx: &CallerContext,
    dataset_id: &str,
    version_hash: &str,
    conn: &Connection,
) -> Result<BTreeSet<String>> {
    const OP: &str = "list_tags";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, version_hash = version_hash);

    let result = (|| -> Result<BTreeSet<String>> {
        require_dataset(conn, ctx, dataset_id)?;
        if versions::get_version(conn, dataset_id, version_hash)?.is_none() {
            return Err(VersioningError::VersionNotFound {
                dataset_id: dataset_id.to_string(),
                version_hash: version_hash.to_string(),
            }
            .into());
        }
        tags::tags_for_version(conn, version_hash)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(found) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            count = found.len()
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}
