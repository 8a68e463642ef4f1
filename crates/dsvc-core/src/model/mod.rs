//! Domain model for dataset version control.
//!
//! Drafts and snapshots are two concrete entity kinds joined by an explicit
//! lineage field (`VersionedItem::draft_item_id`), never by shared ownership.

pub mod dataset;
pub mod item;
pub mod page;
pub mod version;

pub use dataset::Dataset;
pub use item::{DraftItem, ItemData, NewDraftItem, VersionedItem};
pub use page::Page;
pub use version::{DatasetVersion, DatasetVersionTag, VersionStatistics};

/// Reserved tag that always points at the most recently committed version
pub const LATEST_TAG: &str = "latest";

/// Reference sentinel naming the live draft collection
pub const DRAFT_REF: &str = "draft";
