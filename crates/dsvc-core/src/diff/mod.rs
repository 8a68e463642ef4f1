//! Item diff engine.
//!
//! Joins two item collections on their lineage keys and classifies every
//! key as added, modified, deleted or unchanged. Used by commit (latest
//! version vs draft) and by compare (any two references).
//!
//! ## Entry point
//!
//! ```ignore
//! use dsvc_core::diff::{compute_item_diff, LineageItem};
//!
//! let diff = compute_item_diff(
//!     latest_items.iter().map(LineageItem::lineage_entry),
//!     draft_items.iter().map(LineageItem::lineage_entry),
//! )?;
//! let stats = diff.statistics();
//! ```
//!
//! ## Guarantees
//!
//! - **Determinism**: every key list is sorted, so identical inputs give identical output.
//! - **Pure**: no storage access; callers load both sides first.
//! - **Deep equality**: item payloads compare as JSON values, ignoring object key order.

pub mod engine;
pub mod human_summary;
pub mod model;

pub use engine::compute_item_diff;
pub use human_summary::{render_comparison_summary, SideLabel};
pub use model::{DiffStatistics, ItemDiff, LineageEntry, LineageItem};
