//! Engine-level commands applied through one dispatch seam.
//!
//! Callers that drive the engine generically (the CLI, scripted batches)
//! build an [`EngineCommand`] and hand it to [`apply_engine_command`]; each
//! variant maps onto exactly one operation function.

use dsvc_core::config::EngineConfig;
use dsvc_core::lock::DatasetLockService;
use dsvc_core::model::{Dataset, DatasetVersion, DatasetVersionTag, DraftItem, NewDraftItem, Page};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeSet;

use super::commit::{commit_version, CommitRequest};
use super::compare::{compare_versions, ComparisonResult};
use super::items::{delete_draft_items, get_items, list_draft_items, upsert_draft_items, ItemsPage};
use super::resolve::retrieve_version;
use super::restore::restore_version;
use super::tags::{create_tag, delete_tag, list_tags};
use super::versions::{list_versions, update_version, VersionUpdate};
use super::{datasets, PageRequest};

/// One engine operation with its inputs.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    CreateDataset {
        name: String,
        description: Option<String>,
    },
    GetDataset {
        dataset_id: String,
    },
    ListDatasets,
    UpsertDraftItems {
        dataset_id: String,
        items: Vec<NewDraftItem>,
    },
    DeleteDraftItems {
        dataset_id: String,
        ids: Vec<String>,
    },
    ListDraftItems {
        dataset_id: String,
    },
    Commit(CommitRequest),
    ListVersions {
        dataset_id: String,
        page: PageRequest,
    },
    GetItems {
        dataset_id: String,
        reference: Option<String>,
        page: PageRequest,
    },
    RetrieveVersion {
        dataset_id: String,
        name: String,
    },
    UpdateVersion {
        dataset_id: String,
        reference: String,
        update: VersionUpdate,
    },
    CreateTag {
        dataset_id: String,
        version_ref: String,
        tag: String,
    },
    DeleteTag {
        dataset_id: String,
        version_hash: String,
        tag: String,
    },
    ListTags {
        dataset_id: String,
        version_hash: String,
    },
    Compare {
        dataset_id: String,
        from: Option<String>,
        to: Option<String>,
    },
    Restore {
        dataset_id: String,
        reference: String,
    },
}

/// Result of applying an [`EngineCommand`], one variant per output shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EngineCommandResult {
    Dataset(Dataset),
    Datasets(Vec<Dataset>),
    DraftItems(Vec<DraftItem>),
    Removed(u64),
    Version(DatasetVersion),
    Versions(Page<DatasetVersion>),
    Items(ItemsPage),
    Tag(DatasetVersionTag),
    TagDeleted(bool),
    Tags(BTreeSet<String>),
    Comparison(ComparisonResult),
}

/// Apply one command for `ctx`.
///
/// Lock timeouts and page bounds come from `config`; `locks` is only used by
/// commits.
pub fn apply_engine_command(
    cmd: EngineCommand,
    ctx: &CallerContext,
    conn: &mut Connection,
    locks: &dyn DatasetLockService,
    config: &EngineConfig,
) -> Result<EngineCommandResult> {
    let paging = &config.paging;
    match cmd {
        EngineCommand::CreateDataset { name, description } => {
            datasets::create_dataset(ctx, &name, description.as_deref(), conn)
                .map(EngineCommandResult::Dataset)
        }
        EngineCommand::GetDataset { dataset_id } => {
            datasets::get_dataset(ctx, &dataset_id, conn).map(EngineCommandResult::Dataset)
        }
        EngineCommand::ListDatasets => {
            datasets::list_datasets(ctx, conn).map(EngineCommandResult::Datasets)
        }
        EngineCommand::UpsertDraftItems { dataset_id, items } => {
            upsert_draft_items(ctx, &dataset_id, &items, conn).map(EngineCommandResult::DraftItems)
        }
        EngineCommand::DeleteDraftItems { dataset_id, ids } => {
            delete_draft_items(ctx, &dataset_id, &ids, conn).map(EngineCommandResult::Removed)
        }
        EngineCommand::ListDraftItems { dataset_id } => {
            list_draft_items(ctx, &dataset_id, conn).map(EngineCommandResult::DraftItems)
        }
        EngineCommand::Commit(request) => {
            commit_version(ctx, &request, conn, locks, config.lock.timeout())
                .map(EngineCommandResult::Version)
        }
        EngineCommand::ListVersions { dataset_id, page } => {
            list_versions(ctx, &dataset_id, page, paging, conn).map(EngineCommandResult::Versions)
        }
        EngineCommand::GetItems {
            dataset_id,
            reference,
            page,
        } => get_items(ctx, &dataset_id, reference.as_deref(), page, paging, conn)
            .map(EngineCommandResult::Items),
        EngineCommand::RetrieveVersion { dataset_id, name } => {
            retrieve_version(ctx, &dataset_id, &name, conn).map(EngineCommandResult::Version)
        }
        EngineCommand::UpdateVersion {
            dataset_id,
            reference,
            update,
        } => update_version(ctx, &dataset_id, &reference, &update, conn)
            .map(EngineCommandResult::Version),
        EngineCommand::CreateTag {
            dataset_id,
            version_ref,
            tag,
        } => create_tag(ctx, &dataset_id, &version_ref, &tag, conn).map(EngineCommandResult::Tag),
        EngineCommand::DeleteTag {
            dataset_id,
            version_hash,
            tag,
        } => delete_tag(ctx, &dataset_id, &version_hash, &tag, conn)
            .map(EngineCommandResult::TagDeleted),
        EngineCommand::ListTags {
            dataset_id,
            version_hash,
        } => list_tags(ctx, &dataset_id, &version_hash, conn).map(EngineCommandResult::Tags),
        EngineCommand::Compare {
            dataset_id,
            from,
            to,
        } => compare_versions(ctx, &dataset_id, from.as_deref(), to.as_deref(), conn)
            .map(EngineCommandResult::Comparison),
        EngineCommand::Restore {
            dataset_id,
            reference,
        } => restore_version(ctx, &dataset_id, &reference, conn).map(EngineCommandResult::Version),
    }
}
