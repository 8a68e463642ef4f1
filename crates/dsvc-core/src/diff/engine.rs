//! Item diff computation engine.
//!
//! The core entry point is [`compute_item_diff`], which joins two item
//! collections on their lineage keys and classifies every key.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::diff::model::{ItemDiff, LineageEntry};
use crate::errors::VersioningError;
use crate::model::ItemData;

/// Index a collection by lineage key.
///
/// A key seen twice on the same side means the collection is corrupt (the
/// store enforces uniqueness), so it is reported instead of silently
/// keeping one of the payloads.
fn index_by_key<'a, I>(
    side: &str,
    entries: I,
) -> Result<BTreeMap<&'a str, &'a ItemData>, VersioningError>
where
    I: IntoIterator<Item = LineageEntry<'a>>,
{
    let mut index = BTreeMap::new();
    for entry in entries {
        match index.entry(entry.key) {
            Entry::Vacant(slot) => {
                slot.insert(entry.data);
            }
            Entry::Occupied(_) => {
                return Err(VersioningError::Internal {
                    message: format!(
                        "duplicate lineage key '{}' in {} collection",
                        entry.key, side
                    ),
                });
            }
        }
    }
    Ok(index)
}

/// Compute the four-way diff from `left` (older) to `right` (newer).
///
/// - key only in `right` → added
/// - key only in `left` → deleted
/// - key in both → modified when the payloads differ by deep JSON equality
///   (object key order ignored), otherwise unchanged
///
/// Diffing against an empty `left` classifies every item as added, which is
/// exactly the first-commit case.
///
/// # Errors
///
/// - `Internal`: a lineage key occurs more than once on one side
pub fn compute_item_diff<'a, L, R>(left: L, right: R) -> Result<ItemDiff, VersioningError>
where
    L: IntoIterator<Item = LineageEntry<'a>>,
    R: IntoIterator<Item = LineageEntry<'a>>,
{
    let left = index_by_key("left", left)?;
    let right = index_by_key("right", right)?;

    let mut diff = ItemDiff::default();

    // BTreeMap iteration keeps every output list sorted
    for (key, right_data) in &right {
        match left.get(key) {
            None => diff.added.push((*key).to_string()),
            Some(left_data) if left_data != right_data => diff.modified.push((*key).to_string()),
            Some(_) => diff.unchanged.push((*key).to_string()),
        }
    }
    for key in left.keys() {
        if !right.contains_key(key) {
            diff.deleted.push((*key).to_string());
        }
    }

    tracing::debug!(
        left_len = left.len(),
        right_len = right.len(),
        added = diff.added.len(),
        modified = diff.modified.len(),
        deleted = diff.deleted.len(),
        unchanged = diff.unchanged.len(),
        "Computed item diff"
    );

    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::model::{LineageItem, LineageEntry};
    use serde_json::{json, Value};

    fn data(v: Value) -> ItemData {
        v.as_object().cloned().unwrap()
    }

    fn entries<'a>(items: &'a [(String, ItemData)]) -> Vec<LineageEntry<'a>> {
        items
            .iter()
            .map(|(k, d)| LineageEntry { key: k, data: d })
            .collect()
    }

    fn item(key: &str, v: Value) -> (String, ItemData) {
        (key.to_string(), data(v))
    }

    #[test]
    fn test_empty_left_is_all_added() {
        let right = vec![item("a", json!({"x": 1})), item("b", json!({"x": 2}))];
        let diff = compute_item_diff(Vec::new(), entries(&right)).unwrap();
        assert_eq!(diff.added, vec!["a", "b"]);
        assert!(diff.modified.is_empty());
        assert!(diff.deleted.is_empty());
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn test_self_diff_is_all_unchanged() {
        let side = vec![item("a", json!({"x": 1})), item("b", json!({"x": 2}))];
        let diff = compute_item_diff(entries(&side), entries(&side)).unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.unchanged, vec!["a", "b"]);
    }

    #[test]
    fn test_four_way_classification() {
        let left = vec![
            item("a", json!({"q": "a"})),
            item("b", json!({"q": "b"})),
            item("c", json!({"q": "c"})),
        ];
        let right = vec![
            item("b", json!({"q": "b"})),
            item("c", json!({"q": "c2"})),
            item("d", json!({"q": "d"})),
        ];
        let diff = compute_item_diff(entries(&left), entries(&right)).unwrap();
        assert_eq!(diff.added, vec!["d"]);
        assert_eq!(diff.modified, vec!["c"]);
        assert_eq!(diff.deleted, vec!["a"]);
        assert_eq!(diff.unchanged, vec!["b"]);
    }

    #[test]
    fn test_key_order_is_not_a_modification() {
        let left = vec![item("a", json!({"input": "hi", "output": "yo"}))];
        let right = vec![item("a", json!({"output": "yo", "input": "hi"}))];
        let diff = compute_item_diff(entries(&left), entries(&right)).unwrap();
        assert_eq!(diff.unchanged, vec!["a"]);
    }

    #[test]
    fn test_nested_value_change_is_modification() {
        let left = vec![item("a", json!({"meta": {"tags": ["x", "y"]}}))];
        let right = vec![item("a", json!({"meta": {"tags": ["y", "x"]}}))];
        let diff = compute_item_diff(entries(&left), entries(&right)).unwrap();
        assert_eq!(diff.modified, vec!["a"]);
    }

    #[test]
    fn test_duplicate_key_is_internal_error() {
        let left = vec![item("a", json!({})), item("a", json!({"x": 1}))];
        let err = compute_item_diff(entries(&left), Vec::new()).unwrap_err();
        assert!(matches!(err, VersioningError::Internal { .. }));
    }

    #[test]
    fn test_lineage_item_uses_draft_item_id_for_versions() {
        use crate::model::VersionedItem;
        let now = chrono::Utc::now();
        let versioned = VersionedItem {
            id: "snapshot-row".to_string(),
            version_hash: "h".to_string(),
            dataset_id: "ds".to_string(),
            draft_item_id: "draft-1".to_string(),
            data: data(json!({"x": 1})),
            created_at: now,
        };
        assert_eq!(versioned.lineage_entry().key, "draft-1");
    }
}
