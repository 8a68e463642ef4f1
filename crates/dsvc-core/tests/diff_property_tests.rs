#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Property tests for the item diff engine.

use dsvc_core::diff::{compute_item_diff, LineageEntry};
use dsvc_core::model::ItemData;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn data(v: Value) -> ItemData {
    v.as_object().cloned().unwrap()
}

/// Collection keyed by a small key space so sides overlap often
fn arb_collection() -> impl Strategy<Value = BTreeMap<String, ItemData>> {
    prop::collection::btree_map(
        "[a-h]",
        (0u8..4).prop_map(|n| data(json!({ "value": n }))),
        0..8,
    )
}

fn entries(side: &BTreeMap<String, ItemData>) -> Vec<LineageEntry<'_>> {
    side.iter()
        .map(|(key, data)| LineageEntry { key, data })
        .collect()
}

proptest! {
    #[test]
    fn prop_self_diff_is_all_unchanged(side in arb_collection()) {
        let diff = compute_item_diff(entries(&side), entries(&side)).unwrap();
        prop_assert!(diff.is_empty());
        prop_assert_eq!(diff.unchanged.len(), side.len());
    }

    #[test]
    fn prop_counts_partition_both_sides(left in arb_collection(), right in arb_collection()) {
        let stats = compute_item_diff(entries(&left), entries(&right)).unwrap().statistics();
        prop_assert_eq!(stats.right_total(), right.len() as u64);
        prop_assert_eq!(stats.left_total(), left.len() as u64);
    }

    #[test]
    fn prop_swapping_sides_swaps_added_and_deleted(left in arb_collection(), right in arb_collection()) {
        let forward = compute_item_diff(entries(&left), entries(&right)).unwrap();
        let backward = compute_item_diff(entries(&right), entries(&left)).unwrap();
        prop_assert_eq!(&forward.added, &backward.deleted);
        prop_assert_eq!(&forward.deleted, &backward.added);
        prop_assert_eq!(&forward.modified, &backward.modified);
        prop_assert_eq!(&forward.unchanged, &backward.unchanged);
    }

    #[test]
    fn prop_input_order_does_not_matter(left in arb_collection(), right in arb_collection()) {
        let mut reversed = entries(&right);
        reversed.reverse();
        let a = compute_item_diff(entries(&left), entries(&right)).unwrap();
        let b = compute_item_diff(entries(&left), reversed).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn test_delete_one_add_two_scenario() {
    let v1: BTreeMap<String, ItemData> = [("a", "A"), ("b", "B"), ("c", "C")]
        .into_iter()
        .map(|(k, q)| (k.to_string(), data(json!({ "question": q }))))
        .collect();
    let mut v2 = v1.clone();
    v2.remove("a");
    v2.insert("d".to_string(), data(json!({ "question": "D" })));
    v2.insert("e".to_string(), data(json!({ "question": "E" })));

    let diff = compute_item_diff(entries(&v1), entries(&v2)).unwrap();
    let stats = diff.statistics();
    assert_eq!(stats.items_added, 2);
    assert_eq!(stats.items_deleted, 1);
    assert_eq!(stats.items_modified, 0);
    assert_eq!(stats.items_unchanged, 2);

    let recorded = stats.to_version_statistics();
    assert_eq!(recorded.items_total, 4);
    assert_eq!(recorded.items_unchanged(), 2);
}
