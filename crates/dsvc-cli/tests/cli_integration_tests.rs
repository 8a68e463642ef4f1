//! CLI integration tests
//!
//! Drive the built `dsvc` binary end to end against a temporary store.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct Cli {
    dir: TempDir,
    db: PathBuf,
}

impl Cli {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join(".dsvc").join("store.db");
        Self { dir, db }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_dsvc"))
            .current_dir(self.dir.path())
            .env("RUST_LOG", "off")
            .arg("--db")
            .arg(&self.db)
            .args(["--workspace", "ws-cli", "--user", "tester"])
            .args(args)
            .output()
            .expect("Failed to execute CLI")
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "dsvc {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn write(&self, name: &str, content: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, content).unwrap();
        path_str(&path)
    }
}

fn path_str(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

#[test]
fn test_cli_commit_compare_restore_round() {
    let cli = Cli::new();

    let dataset = cli.json(&["dataset", "create", "--name", "qa"]);
    let id = dataset["id"].as_str().unwrap().to_string();

    let file = cli.write(
        "items.json",
        r#"[{"id": "a", "data": {"q": 1}}, {"id": "b", "data": {"q": 2}}]"#,
    );
    let items = cli.json(&["items", "put", "--dataset", &id, "--file", &file]);
    assert_eq!(items.as_array().unwrap().len(), 2);

    let v1 = cli.json(&["version", "commit", "--dataset", &id, "-m", "first", "--tag", "gold"]);
    assert_eq!(v1["sequence"], 1);
    assert_eq!(v1["items_added"], 2);
    assert_eq!(v1["created_by"], "tester");

    cli.json(&["items", "delete", "--dataset", &id, "--id", "a"]);
    let cmp = cli.json(&["version", "compare", "--dataset", &id, "--from", "gold"]);
    assert_eq!(cmp["to_label"], "draft");
    assert_eq!(cmp["statistics"]["items_deleted"], 1);

    let restored = cli.json(&["version", "restore", "--dataset", &id, "gold"]);
    assert_eq!(restored["version_hash"], v1["version_hash"]);

    let summary = cli.run(&["version", "compare", "--dataset", &id, "--from", "gold", "--summary"]);
    assert!(summary.status.success());
    assert!(String::from_utf8_lossy(&summary.stdout).contains("_No item changes detected._"));
}

#[test]
fn test_cli_version_listing_and_tags() {
    let cli = Cli::new();
    let id = cli.json(&["dataset", "create", "--name", "qa"])["id"]
        .as_str()
        .unwrap()
        .to_string();

    let v1 = cli.json(&["version", "commit", "--dataset", &id]);
    cli.json(&["version", "commit", "--dataset", &id, "--meta", "source=csv"]);
    let hash = v1["version_hash"].as_str().unwrap().to_string();

    let listed = cli.json(&["version", "list", "--dataset", &id, "--size", "1"]);
    assert_eq!(listed["total"], 2);
    assert_eq!(listed["content"][0]["sequence"], 2);
    assert_eq!(listed["content"][0]["metadata"]["source"], "csv");

    let tag = cli.json(&["tag", "add", "--dataset", &id, "--version", &hash, "baseline"]);
    assert_eq!(tag["version_hash"].as_str(), Some(hash.as_str()));

    let shown = cli.json(&["version", "show", "--dataset", &id, "baseline"]);
    assert_eq!(shown["sequence"], 1);

    let deleted = cli.json(&["tag", "rm", "--dataset", &id, "--version", &hash, "baseline"]);
    assert_eq!(deleted["deleted"], true);
    let again = cli.json(&["tag", "rm", "--dataset", &id, "--version", &hash, "baseline"]);
    assert_eq!(again["deleted"], false);
}

#[test]
fn test_cli_errors_exit_nonzero() {
    let cli = Cli::new();
    let id = cli.json(&["dataset", "create", "--name", "qa"])["id"]
        .as_str()
        .unwrap()
        .to_string();
    let v1 = cli.json(&["version", "commit", "--dataset", &id]);
    let hash = v1["version_hash"].as_str().unwrap();

    let output = cli.run(&["tag", "rm", "--dataset", &id, "--version", hash, "latest"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_VALIDATION"));

    let output = cli.run(&["version", "show", "--dataset", &id, "missing"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_NOT_FOUND"));
}

#[test]
fn test_cli_reads_config_file() {
    let cli = Cli::new();
    let config = cli.write(
        "dsvc.toml",
        "[paging]\ndefault_page_size = 2\nmax_page_size = 5\n\n[lock]\nbackend = \"in_process\"\n",
    );
    let id = cli.json(&["--config", &config, "dataset", "create", "--name", "qa"])["id"]
        .as_str()
        .unwrap()
        .to_string();

    let output = cli.run(&[
        "--config", &config, "version", "list", "--dataset", &id, "--size", "6",
    ]);
    assert!(!output.status.success());

    let bad = cli.write("bad.toml", "[lock]\nbackend = \"carrier-pigeon\"\n");
    let output = cli.run(&["--config", &bad, "dataset", "list"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERR_CONFIG"));
}
