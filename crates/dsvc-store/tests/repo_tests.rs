// Row-level repository behavior: datasets, drafts, versions and tags

use chrono::Utc;
use dsvc_core::model::{Dataset, DatasetVersion, DatasetVersionTag, ItemData, VersionedItem};
use dsvc_core::ExErrorKind;
use dsvc_store::repo::{datasets, draft_items, tags, versions};
use rusqlite::Connection;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet};

fn setup() -> Connection {
    let conn = dsvc_store::db::open_store_in_memory().unwrap();
    for (id, name) in [("ds-1", "first"), ("ds-2", "second")] {
        datasets::insert_dataset(
            &conn,
            &Dataset {
                id: id.to_string(),
                workspace_id: "ws-1".to_string(),
                name: name.to_string(),
                description: None,
                created_at: Utc::now(),
                created_by: "alice".to_string(),
            },
        )
        .unwrap();
    }
    conn
}

fn data(v: serde_json::Value) -> ItemData {
    v.as_object().cloned().unwrap()
}

fn version(dataset_id: &str, hash: &str, sequence: u64) -> DatasetVersion {
    let now = Utc::now();
    DatasetVersion {
        version_hash: hash.to_string(),
        dataset_id: dataset_id.to_string(),
        sequence,
        created_at: now,
        created_by: "alice".to_string(),
        change_description: None,
        metadata: BTreeMap::new(),
        statistics: Default::default(),
        tags: BTreeSet::new(),
        last_updated_at: now,
        last_updated_by: "alice".to_string(),
    }
}

fn snapshot(conn: &Connection, dataset_id: &str, hash: &str, items: &[(&str, serde_json::Value)]) {
    let rows: Vec<VersionedItem> = items
        .iter()
        .map(|(draft_id, v)| VersionedItem {
            id: format!("{}-{}", hash, draft_id),
            version_hash: hash.to_string(),
            dataset_id: dataset_id.to_string(),
            draft_item_id: draft_id.to_string(),
            data: data(v.clone()),
            created_at: Utc::now(),
        })
        .collect();
    versions::insert_version_items(conn, &rows).unwrap();
}

fn tag(dataset_id: &str, name: &str, hash: &str) -> DatasetVersionTag {
    DatasetVersionTag {
        dataset_id: dataset_id.to_string(),
        tag: name.to_string(),
        version_hash: hash.to_string(),
        created_at: Utc::now(),
        created_by: "alice".to_string(),
    }
}

#[test]
fn test_dataset_name_unique_per_workspace() {
    let conn = setup();
    let dup = Dataset {
        id: "ds-3".to_string(),
        workspace_id: "ws-1".to_string(),
        name: "first".to_string(),
        description: None,
        created_at: Utc::now(),
        created_by: "bob".to_string(),
    };
    let err = datasets::insert_dataset(&conn, &dup).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Conflict);

    assert!(datasets::get_dataset(&conn, "ws-2", "ds-1").unwrap().is_none());
    assert_eq!(datasets::list_datasets(&conn, "ws-1").unwrap().len(), 2);
}

#[test]
fn test_draft_upsert_keeps_created_at() {
    let conn = setup();
    let first = draft_items::upsert_draft_item(&conn, "ds-1", "a", &data(json!({"q": 1})), Utc::now())
        .unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = draft_items::upsert_draft_item(&conn, "ds-1", "a", &data(json!({"q": 2})), Utc::now())
        .unwrap();

    assert_eq!(second.created_at, first.created_at);
    assert!(second.last_updated_at > first.last_updated_at);
    assert_eq!(second.data, data(json!({"q": 2})));
    assert_eq!(draft_items::count_draft_items(&conn, "ds-1").unwrap(), 1);
}

#[test]
fn test_draft_id_owned_by_other_dataset_conflicts() {
    let conn = setup();
    draft_items::upsert_draft_item(&conn, "ds-1", "shared", &data(json!({})), Utc::now()).unwrap();
    let err = draft_items::upsert_draft_item(&conn, "ds-2", "shared", &data(json!({"x": 1})), Utc::now())
        .unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Conflict);

    let original = draft_items::get_draft_item(&conn, "ds-1", "shared").unwrap().unwrap();
    assert_eq!(original.data, data(json!({})));
}

#[test]
fn test_item_data_key_order_survives_storage() {
    let conn = setup();
    let payload = data(json!({"zeta": 1, "alpha": 2}));
    draft_items::upsert_draft_item(&conn, "ds-1", "a", &payload, Utc::now()).unwrap();
    let stored = draft_items::get_draft_item(&conn, "ds-1", "a").unwrap().unwrap();
    let keys: Vec<_> = stored.data.keys().cloned().collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[test]
fn test_version_pages_newest_first() {
    let conn = setup();
    for seq in 1..=3 {
        versions::insert_version(&conn, &version("ds-1", &format!("h{}", seq), seq)).unwrap();
    }
    assert_eq!(versions::next_sequence(&conn, "ds-1").unwrap(), 4);
    assert_eq!(versions::next_sequence(&conn, "ds-2").unwrap(), 1);

    let page = versions::page_versions(&conn, "ds-1", 1, 2).unwrap();
    assert_eq!(page.total, 3);
    let hashes: Vec<_> = page.content.iter().map(|v| v.version_hash.as_str()).collect();
    assert_eq!(hashes, vec!["h3", "h2"]);
}

#[test]
fn test_duplicate_sequence_rejected() {
    let conn = setup();
    versions::insert_version(&conn, &version("ds-1", "h1", 1)).unwrap();
    assert!(versions::insert_version(&conn, &version("ds-1", "h1b", 1)).is_err());
}

#[test]
fn test_get_version_is_dataset_scoped() {
    let conn = setup();
    versions::insert_version(&conn, &version("ds-1", "h1", 1)).unwrap();
    tags::insert_tag(&conn, &tag("ds-1", "gold", "h1")).unwrap();

    let found = versions::get_version(&conn, "ds-1", "h1").unwrap().unwrap();
    assert!(found.tags.contains("gold"));
    assert!(versions::get_version(&conn, "ds-2", "h1").unwrap().is_none());
}

#[test]
fn test_tag_rows() {
    let conn = setup();
    versions::insert_version(&conn, &version("ds-1", "h1", 1)).unwrap();
    versions::insert_version(&conn, &version("ds-1", "h2", 2)).unwrap();

    tags::insert_tag(&conn, &tag("ds-1", "gold", "h1")).unwrap();
    let err = tags::insert_tag(&conn, &tag("ds-1", "gold", "h2")).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Conflict);

    tags::move_latest(&conn, &tag("ds-1", "latest", "h1")).unwrap();
    tags::move_latest(&conn, &tag("ds-1", "latest", "h2")).unwrap();
    assert_eq!(tags::count_tag(&conn, "ds-1", "latest").unwrap(), 1);
    assert_eq!(tags::find_tag(&conn, "ds-1", "latest").unwrap().as_deref(), Some("h2"));

    assert!(!tags::delete_tag(&conn, "ds-1", "gold", "h2").unwrap());
    assert!(tags::delete_tag(&conn, "ds-1", "gold", "h1").unwrap());
    assert!(tags::tags_for_version(&conn, "h1").unwrap().is_empty());
}

#[test]
fn test_version_info_update_keeps_unset_fields() {
    let conn = setup();
    let mut v = version("ds-1", "h1", 1);
    v.change_description = Some("initial".to_string());
    versions::insert_version(&conn, &v).unwrap();

    let mut metadata = BTreeMap::new();
    metadata.insert("k".to_string(), "v".to_string());
    let update = versions::VersionInfoUpdate {
        change_description: None,
        metadata: Some(&metadata),
    };
    assert!(versions::update_version_info(&conn, "ds-1", "h1", &update, Utc::now(), "bob").unwrap());

    let reread = versions::get_version(&conn, "ds-1", "h1").unwrap().unwrap();
    assert_eq!(reread.change_description.as_deref(), Some("initial"));
    assert_eq!(reread.metadata, metadata);
    assert_eq!(reread.last_updated_by, "bob");
}

#[test]
fn test_replace_draft_with_version() {
    let conn = setup();
    versions::insert_version(&conn, &version("ds-1", "h1", 1)).unwrap();
    snapshot(&conn, "ds-1", "h1", &[("a", json!({"q": 1})), ("b", json!({"q": 2}))]);

    let now = Utc::now();
    draft_items::upsert_draft_item(&conn, "ds-1", "b", &data(json!({"q": 2})), now).unwrap();
    draft_items::upsert_draft_item(&conn, "ds-1", "c", &data(json!({"q": 3})), now).unwrap();

    let counts = draft_items::replace_draft_with_version(&conn, "ds-1", "h1", Utc::now()).unwrap();
    assert_eq!(counts.removed, 1);
    assert_eq!(counts.written, 1);

    let draft = draft_items::list_draft_items(&conn, "ds-1").unwrap();
    let ids: Vec<_> = draft.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert_eq!(draft[0].data, data(json!({"q": 1})));
}

#[test]
fn test_version_item_pages_ordered_by_id() {
    let conn = setup();
    versions::insert_version(&conn, &version("ds-1", "h1", 1)).unwrap();
    snapshot(
        &conn,
        "ds-1",
        "h1",
        &[("c", json!({})), ("a", json!({})), ("b", json!({}))],
    );

    let first = versions::page_version_items(&conn, "h1", 1, 2).unwrap();
    let second = versions::page_version_items(&conn, "h1", 2, 2).unwrap();
    assert_eq!(first.total, 3);
    let ids: Vec<_> = first
        .content
        .iter()
        .chain(second.content.iter())
        .map(|i| i.draft_item_id.as_str())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}
