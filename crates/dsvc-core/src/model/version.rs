use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::LATEST_TAG;

/// Commit-time diff counts recorded on a version.
///
/// `items_total = items_added + items_modified + unchanged`; `items_deleted`
/// counts items of the prior `latest` that are absent from this version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStatistics {
    pub items_total: u64,
    pub items_added: u64,
    pub items_modified: u64,
    pub items_deleted: u64,
}

impl VersionStatistics {
    /// Items carried over from the prior version without change
    pub fn items_unchanged(&self) -> u64 {
        self.items_total
            .saturating_sub(self.items_added)
            .saturating_sub(self.items_modified)
    }
}

/// An immutable, point-in-time snapshot of a dataset's draft.
///
/// Content never changes after commit. Only tag placement and the
/// descriptive fields (`change_description`, `metadata`) can be updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetVersion {
    /// Opaque unique identifier (UUID v7). Not derived from content: two
    /// versions with identical items always get different hashes.
    pub version_hash: String,

    pub dataset_id: String,

    /// 1-based commit ordinal within the dataset
    pub sequence: u64,

    pub created_at: DateTime<Utc>,

    pub created_by: String,

    pub change_description: Option<String>,

    pub metadata: BTreeMap<String, String>,

    #[serde(flatten)]
    pub statistics: VersionStatistics,

    pub tags: BTreeSet<String>,

    pub last_updated_at: DateTime<Utc>,

    pub last_updated_by: String,
}

impl DatasetVersion {
    /// Display name (`v1`, `v2`, ...). Not accepted as a reference.
    pub fn version_name(&self) -> String {
        format!("v{}", self.sequence)
    }

    /// Whether this version currently holds the `latest` tag
    pub fn is_latest(&self) -> bool {
        self.tags.contains(LATEST_TAG)
    }
}

/// A tag row: a mutable pointer from a name to a version hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetVersionTag {
    pub dataset_id: String,
    pub tag: String,
    pub version_hash: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}
