//! Version listing and descriptive updates.

use chrono::Utc;
use dsvc_core::config::PagingConfig;
use dsvc_core::errors::{ExError, ExErrorKind};
use dsvc_core::model::{DatasetVersion, DatasetVersionTag, Page};
use dsvc_core::rules::{validate_change_description, validate_metadata, validate_user_tag};
use dsvc_core::{log_op_end, log_op_error, log_op_start};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::{persistence, Result};
use dsvc_store::repo::versions::VersionInfoUpdate;
use dsvc_store::repo::{tags, versions};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use super::resolve::resolve_committed;
use super::{annotate, elapsed_ms, require_dataset, PageRequest};

/// Versions of a dataset, newest first, each with its tags.
///
/// # Errors
/// - `Validation`: out-of-range page
/// - `NotFound`: unknown dataset
pub fn list_versions(
    ctx: &CallerContext,
    dataset_id: &str,
    page: PageRequest,
    paging: &PagingConfig,
    conn: &mut Connection,
) -> Result<Page<DatasetVersion>> {
    const OP: &str = "list_versions";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id);

    let result = (|| {
        let (page, size) = page.resolve(paging)?;
        require_dataset(conn, ctx, dataset_id)?;
        let tx = conn.transaction().map_err(|e| persistence(OP, e))?;
        let listed = versions::page_versions(&tx, dataset_id, page, size)?;
        tx.commit().map_err(|e| persistence(OP, e))?;
        Ok::<Page<DatasetVersion>, ExError>(listed)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(listed) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            count = listed.content.len(),
            total = listed.total
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// Changes applied by [`update_version`]. Content never changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionUpdate {
    pub change_description: Option<String>,
    /// Replaces the whole metadata map when present
    pub metadata: Option<BTreeMap<String, String>>,
    pub tags_to_add: Vec<String>,
}

impl VersionUpdate {
    pub fn is_empty(&self) -> bool {
        self.change_description.is_none() && self.metadata.is_none() && self.tags_to_add.is_empty()
    }
}

/// Update a version's description/metadata and add tags, all or nothing.
///
/// # Errors
/// - `Validation`: draft reference, reserved/malformed tag, oversized fields
/// - `NotFound`: unknown dataset or reference
/// - `Conflict`: a tag already exists in the dataset; nothing is changed
pub fn update_version(
    ctx: &CallerContext,
    dataset_id: &str,
    reference: &str,
    update: &VersionUpdate,
    conn: &mut Connection,
) -> Result<DatasetVersion> {
    const OP: &str = "update_version";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, reference = reference);

    let result = update_inner(ctx, dataset_id, reference, update, conn);

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(version) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            version_hash = version.version_hash.as_str()
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

fn update_inner(
    ctx: &CallerContext,
    dataset_id: &str,
    reference: &str,
    update: &VersionUpdate,
    conn: &mut Connection,
) -> Result<DatasetVersion> {
    const OP: &str = "update_version";

    validate_change_description(update.change_description.as_deref())?;
    if let Some(metadata) = &update.metadata {
        validate_metadata(metadata)?;
    }
    let new_tags: BTreeSet<&str> = update.tags_to_add.iter().map(String::as_str).collect();
    for tag in &new_tags {
        validate_user_tag(tag)?;
    }
    require_dataset(conn, ctx, dataset_id)?;

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| persistence(OP, e))?;

    let version = resolve_committed(&tx, dataset_id, reference, OP)?;
    let now = Utc::now();

    let info = VersionInfoUpdate {
        change_description: update.change_description.as_deref(),
        metadata: update.metadata.as_ref(),
    };
    versions::update_version_info(
        &tx,
        dataset_id,
        &version.version_hash,
        &info,
        now,
        &ctx.user_name,
    )?;

    for tag in new_tags {
        tags::insert_tag(
            &tx,
            &DatasetVersionTag {
                dataset_id: dataset_id.to_string(),
                tag: tag.to_string(),
                version_hash: version.version_hash.clone(),
                created_at: now,
                created_by: ctx.user_name.clone(),
            },
        )?;
    }

    let updated = versions::get_version(&tx, dataset_id, &version.version_hash)?.ok_or_else(|| {
        ExError::new(ExErrorKind::Internal)
            .with_op(OP)
            .with_version_ref(version.version_hash.as_str())
            .with_message("version vanished during update")
    })?;

    tx.commit().map_err(|e| persistence(OP, e))?;
    Ok(updated)
}
