use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Item payload: an ordered JSON object.
///
/// Key order is preserved on round-trip; equality ignores it.
pub type ItemData = Map<String, Value>;

/// A mutable item in a dataset's draft collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftItem {
    /// Stable identity for the lifetime of the draft item (UUID v7)
    pub id: String,

    pub dataset_id: String,

    pub data: ItemData,

    pub created_at: DateTime<Utc>,

    pub last_updated_at: DateTime<Utc>,
}

/// Input for inserting or replacing a draft item.
///
/// When `id` is `None` a fresh identity is allocated; when it names an
/// existing draft item that item's data is replaced in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDraftItem {
    #[serde(default)]
    pub id: Option<String>,
    pub data: ItemData,
}

impl NewDraftItem {
    /// Build an input with a freshly allocated identity
    pub fn new(data: ItemData) -> Self {
        Self { id: None, data }
    }

    /// Build an input that targets a known identity
    pub fn with_id(id: impl Into<String>, data: ItemData) -> Self {
        Self {
            id: Some(id.into()),
            data,
        }
    }
}

/// An immutable copy of a draft item frozen into one version.
///
/// `id` is unique per snapshot and never reused, even when the content is
/// unchanged from the previous version. `draft_item_id` is a weak lineage
/// pointer used only for diff joins and traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedItem {
    pub id: String,

    pub version_hash: String,

    pub dataset_id: String,

    /// Lineage: the draft item this row was copied from
    pub draft_item_id: String,

    /// Copy of `DraftItem::data` at commit time
    pub data: ItemData,

    pub created_at: DateTime<Utc>,
}
