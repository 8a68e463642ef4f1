// Shared fixtures for engine integration tests

#![allow(dead_code)]

use dsvc_core::lock::InProcessLockService;
use dsvc_core::model::{DatasetVersion, ItemData, NewDraftItem};
use dsvc_core_types::CallerContext;
use dsvc_engine::commands::commit::{commit_version, CommitRequest};
use dsvc_engine::commands::datasets::create_dataset;
use dsvc_engine::commands::items::{delete_draft_items, upsert_draft_items};
use rusqlite::Connection;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Fixture {
    pub _dir: TempDir,
    pub db_path: PathBuf,
    pub conn: Connection,
    pub ctx: CallerContext,
    pub locks: InProcessLockService,
    pub dataset_id: String,
}

/// On-disk store with one empty dataset in workspace `ws-1`.
pub fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("store.db");
    let conn = dsvc_store::db::open_store(&db_path).unwrap();
    let ctx = CallerContext::new("ws-1", "alice");
    let dataset = create_dataset(&ctx, "qa-pairs", Some("test data"), &conn).unwrap();

    Fixture {
        _dir: dir,
        db_path,
        conn,
        ctx,
        locks: InProcessLockService::new(),
        dataset_id: dataset.id,
    }
}

pub fn data(v: Value) -> ItemData {
    v.as_object().cloned().unwrap()
}

impl Fixture {
    /// Upsert draft items with explicit ids
    pub fn put(&mut self, items: &[(&str, Value)]) {
        let inputs: Vec<NewDraftItem> = items
            .iter()
            .map(|(id, v)| NewDraftItem::with_id(*id, data(v.clone())))
            .collect();
        upsert_draft_items(&self.ctx, &self.dataset_id, &inputs, &mut self.conn).unwrap();
    }

    pub fn remove(&mut self, ids: &[&str]) {
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        delete_draft_items(&self.ctx, &self.dataset_id, &ids, &mut self.conn).unwrap();
    }

    pub fn commit(&mut self) -> DatasetVersion {
        self.commit_request(CommitRequest::new(self.dataset_id.clone()))
    }

    pub fn commit_tagged(&mut self, tag: &str) -> DatasetVersion {
        self.commit_request(CommitRequest::new(self.dataset_id.clone()).with_tag(tag))
    }

    pub fn commit_request(&mut self, request: CommitRequest) -> DatasetVersion {
        commit_version(&self.ctx, &request, &mut self.conn, &self.locks, LOCK_TIMEOUT).unwrap()
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub fn version_count(&self) -> i64 {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM dataset_versions WHERE dataset_id = ?1",
                [&self.dataset_id],
                |row| row.get(0),
            )
            .unwrap()
    }

    pub fn latest_hash(&self) -> Option<String> {
        dsvc_store::repo::tags::find_tag(&self.conn, &self.dataset_id, "latest").unwrap()
    }
}
