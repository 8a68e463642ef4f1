//! Item diff output types.
//!
//! All key lists are sorted by lineage key so the same inputs always produce
//! the same serialized diff.

use serde::{Deserialize, Serialize};

use crate::model::{DraftItem, ItemData, VersionStatistics, VersionedItem};

/// A diff participant borrowed from either kind of collection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineageEntry<'a> {
    /// Join key across draft and versions: draft `id`, or a snapshot's
    /// `draft_item_id`
    pub key: &'a str,
    pub data: &'a ItemData,
}

/// Anything that can take part in an item diff.
pub trait LineageItem {
    fn lineage_entry(&self) -> LineageEntry<'_>;
}

impl LineageItem for DraftItem {
    fn lineage_entry(&self) -> LineageEntry<'_> {
        LineageEntry {
            key: &self.id,
            data: &self.data,
        }
    }
}

impl LineageItem for VersionedItem {
    fn lineage_entry(&self) -> LineageEntry<'_> {
        LineageEntry {
            key: &self.draft_item_id,
            data: &self.data,
        }
    }
}

/// Four-way classification of items between a left and a right collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDiff {
    /// Lineage keys present only on the right
    pub added: Vec<String>,
    /// Lineage keys present on both sides with different data
    pub modified: Vec<String>,
    /// Lineage keys present only on the left
    pub deleted: Vec<String>,
    /// Lineage keys present on both sides with equal data
    pub unchanged: Vec<String>,
}

impl ItemDiff {
    pub fn statistics(&self) -> DiffStatistics {
        DiffStatistics {
            items_added: self.added.len() as u64,
            items_modified: self.modified.len() as u64,
            items_deleted: self.deleted.len() as u64,
            items_unchanged: self.unchanged.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Counts derived from an [`ItemDiff`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStatistics {
    pub items_added: u64,
    pub items_modified: u64,
    pub items_deleted: u64,
    pub items_unchanged: u64,
}

impl DiffStatistics {
    /// Size of the right-hand collection
    pub fn right_total(&self) -> u64 {
        self.items_added + self.items_modified + self.items_unchanged
    }

    /// Size of the left-hand collection
    pub fn left_total(&self) -> u64 {
        self.items_deleted + self.items_modified + self.items_unchanged
    }

    /// Counts recorded on a version committed from the right-hand side
    pub fn to_version_statistics(&self) -> VersionStatistics {
        VersionStatistics {
            items_total: self.right_total(),
            items_added: self.items_added,
            items_modified: self.items_modified,
            items_deleted: self.items_deleted,
        }
    }
}
