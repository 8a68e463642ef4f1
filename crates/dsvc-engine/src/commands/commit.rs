//! Commit orchestration: freeze the draft into a new immutable version.
//!
//! ## Pipeline (in order):
//! 1. Validate input (tag, description, metadata) and workspace scope; no lock yet
//! 2. Acquire the per-dataset commit lock (bounded wait, LockTimeout on expiry)
//! 3. Open an IMMEDIATE transaction
//! 4. Read the draft and the items of the version currently tagged `latest`
//! 5. Diff prior items against the draft
//! 6. Insert the version row and its snapshot items (fresh ids, draft lineage)
//! 7. Create the requested tag (Conflict aborts everything), move `latest`
//! 8. Commit the transaction, release the lock
//!
//! Any failure in 4-7 drops the transaction, which rolls back every row.
//! The lock guard releases on every exit path.

use chrono::Utc;
use dsvc_core::diff::{compute_item_diff, LineageItem};
use dsvc_core::errors::{ExError, ExErrorKind};
use dsvc_core::lock::{commit_lock_key, DatasetLockService, LockGuard};
use dsvc_core::model::{DatasetVersion, DatasetVersionTag, VersionedItem, LATEST_TAG};
use dsvc_core::rules::{validate_change_description, validate_metadata, validate_user_tag};
use dsvc_core::{log_op_end, log_op_error, log_op_start, log_phase};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::{persistence, Result};
use dsvc_store::repo::{draft_items, tags, versions};
use rusqlite::{Connection, TransactionBehavior};
use std::collections::{BTreeMap, BTreeSet};
use std::time::{Duration, Instant};
use uuid::Uuid;

use super::{annotate, elapsed_ms, require_dataset};

const OP: &str = "commit_version";

/// Input to [`commit_version`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRequest {
    pub dataset_id: String,
    pub change_description: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// Extra user tag placed on the new version alongside `latest`
    pub tag: Option<String>,
}

impl CommitRequest {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.change_description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Progress markers of a commit, logged at debug level on entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPhase {
    Locked,
    Snapshotting,
    Diffing,
    Persisting,
    TagAssignment,
    Unlocked,
}

impl CommitPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CommitPhase::Locked => "locked",
            CommitPhase::Snapshotting => "snapshotting",
            CommitPhase::Diffing => "diffing",
            CommitPhase::Persisting => "persisting",
            CommitPhase::TagAssignment => "tag_assignment",
            CommitPhase::Unlocked => "unlocked",
        }
    }
}

fn enter(phase: CommitPhase, dataset_id: &str) {
    log_phase!(OP, phase.as_str(), dataset_id = dataset_id);
}

/// Commit the dataset's draft as a new version.
///
/// The returned version carries its final tag set (`latest` plus the
/// requested tag, if any).
///
/// # Errors
/// - `Validation`: reserved/malformed tag, oversized description or metadata
/// - `NotFound`: unknown dataset in the caller's workspace
/// - `LockTimeout`: another commit held the dataset lock past `lock_timeout`
/// - `Conflict`: the requested tag already exists in the dataset
/// - `Persistence`: any storage failure; nothing was written
pub fn commit_version(
    ctx: &CallerContext,
    request: &CommitRequest,
    conn: &mut Connection,
    locks: &dyn DatasetLockService,
    lock_timeout: Duration,
) -> Result<DatasetVersion> {
    let start = Instant::now();
    let dataset_id = request.dataset_id.as_str();
    log_op_start!(
        OP,
        dataset_id = dataset_id,
        request_id = ctx.request_id.as_str(),
        tag = request.tag.as_deref().unwrap_or("")
    );

    let result = commit_inner(ctx, request, conn, locks, lock_timeout);

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(version) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            version_hash = version.version_hash.as_str(),
            sequence = version.sequence,
            items_total = version.statistics.items_total,
            items_added = version.statistics.items_added,
            items_modified = version.statistics.items_modified,
            items_deleted = version.statistics.items_deleted
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

fn commit_inner(
    ctx: &CallerContext,
    request: &CommitRequest,
    conn: &mut Connection,
    locks: &dyn DatasetLockService,
    lock_timeout: Duration,
) -> Result<DatasetVersion> {
    let dataset_id = request.dataset_id.as_str();

    if let Some(tag) = &request.tag {
        validate_user_tag(tag)?;
    }
    validate_change_description(request.change_description.as_deref())?;
    validate_metadata(&request.metadata)?;
    require_dataset(conn, ctx, dataset_id)?;

    let guard = LockGuard::acquire(locks, &commit_lock_key(dataset_id), lock_timeout)?;
    enter(CommitPhase::Locked, dataset_id);

    let version = snapshot_in_transaction(ctx, request, conn)?;

    drop(guard);
    enter(CommitPhase::Unlocked, dataset_id);

    Ok(version)
}

/// Steps 3-8: everything that writes, inside one IMMEDIATE transaction.
fn snapshot_in_transaction(
    ctx: &CallerContext,
    request: &CommitRequest,
    conn: &mut Connection,
) -> Result<DatasetVersion> {
    let dataset_id = request.dataset_id.as_str();
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| persistence(OP, e))?;

    enter(CommitPhase::Snapshotting, dataset_id);
    let draft = draft_items::list_draft_items(&tx, dataset_id)?;
    let prior_items = match tags::find_tag(&tx, dataset_id, LATEST_TAG)? {
        Some(prior_hash) => {
            let prior = versions::get_version(&tx, dataset_id, &prior_hash)?.ok_or_else(|| {
                ExError::new(ExErrorKind::Internal)
                    .with_op(OP)
                    .with_dataset_id(dataset_id)
                    .with_version_ref(prior_hash.as_str())
                    .with_message("latest tag points at a missing version")
            })?;
            versions::list_version_items(&tx, &prior.version_hash)?
        }
        None => Vec::new(),
    };

    enter(CommitPhase::Diffing, dataset_id);
    let diff = compute_item_diff(
        prior_items.iter().map(LineageItem::lineage_entry),
        draft.iter().map(LineageItem::lineage_entry),
    )?;
    let statistics = diff.statistics().to_version_statistics();

    enter(CommitPhase::Persisting, dataset_id);
    let now = Utc::now();
    let version_hash = Uuid::now_v7().to_string();
    let mut version = DatasetVersion {
        version_hash: version_hash.clone(),
        dataset_id: dataset_id.to_string(),
        sequence: versions::next_sequence(&tx, dataset_id)?,
        created_at: now,
        created_by: ctx.user_name.clone(),
        change_description: request.change_description.clone(),
        metadata: request.metadata.clone(),
        statistics,
        tags: BTreeSet::new(),
        last_updated_at: now,
        last_updated_by: ctx.user_name.clone(),
    };
    versions::insert_version(&tx, &version)?;

    let snapshot: Vec<VersionedItem> = draft
        .into_iter()
        .map(|item| VersionedItem {
            id: Uuid::now_v7().to_string(),
            version_hash: version_hash.clone(),
            dataset_id: dataset_id.to_string(),
            draft_item_id: item.id,
            data: item.data,
            created_at: now,
        })
        .collect();
    versions::insert_version_items(&tx, &snapshot)?;

    enter(CommitPhase::TagAssignment, dataset_id);
    let tag_row = |tag: &str| DatasetVersionTag {
        dataset_id: dataset_id.to_string(),
        tag: tag.to_string(),
        version_hash: version_hash.clone(),
        created_at: now,
        created_by: ctx.user_name.clone(),
    };
    if let Some(tag) = &request.tag {
        tags::insert_tag(&tx, &tag_row(tag))?;
        version.tags.insert(tag.clone());
    }
    tags::move_latest(&tx, &tag_row(LATEST_TAG))?;
    version.tags.insert(LATEST_TAG.to_string());

    tx.commit().map_err(|e| persistence(OP, e))?;

    tracing::debug!(
        dataset_id = dataset_id,
        version_hash = version_hash.as_str(),
        snapshot_items = snapshot.len(),
        "Committed version"
    );

    Ok(version)
}
