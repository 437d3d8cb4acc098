//! End-to-end tests for the `hub` binary.
//!
//! Every test runs against a fresh store in a temp dir with `HOME` pointed
//! there too, so default folders never touch the real profile.

use assert_cmd::Command;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Env {
    dir: TempDir,
    db: PathBuf,
}

impl Env {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("data").join("hub.db");
        Self { dir, db }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("hub").unwrap();
        cmd.env_remove("HUB_DB")
            .env_remove("RUST_LOG")
            .env("HOME", self.root())
            .env("XDG_CONFIG_HOME", self.root().join(".config"))
            .env("XDG_DATA_HOME", self.root().join(".local/share"))
            .arg("--db")
            .arg(&self.db)
            .arg("--json");
        cmd
    }

    /// Run a command that must succeed and parse its JSON output.
    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).assert().success().get_output().clone();
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn init(&self) -> Value {
        self.json(&["init"])
    }
}

#[test]
fn test_version_reports_package_version() {
    let env = Env::new();
    let out = env.json(&["version"]);
    assert_eq!(out["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_commands_require_init() {
    let env = Env::new();
    let assert = env.cmd().args(["note", "list"]).assert().failure().code(2);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("NOT_INITIALIZED"));
}

#[test]
fn test_init_is_repeatable() {
    let env = Env::new();
    let first = env.init();
    assert_eq!(first["created"], true);
    assert!(first["settings"].as_u64().unwrap() >= 10);

    let second = env.init();
    assert_eq!(second["created"], false);
    assert_eq!(second["settings"], first["settings"]);
}

#[test]
fn test_note_lifecycle_and_search() {
    let env = Env::new();
    env.init();

    let created = env.json(&["note", "create", "Todo", "--content", "Buy milk"]);
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Todo");

    let found = env.json(&["note", "list", "--search", "MILK"]);
    assert_eq!(found["count"], 1);
    assert_eq!(found["notes"][0]["id"], id);

    let none = env.json(&["note", "list", "--search", "bread"]);
    assert_eq!(none["count"], 0);

    let updated = env.json(&["note", "update", &id.to_string(), "--content", "Buy bread"]);
    assert_eq!(updated["title"], "Todo");
    assert_eq!(updated["content"], "Buy bread");

    env.json(&["note", "delete", &id.to_string()]);
    assert_eq!(env.json(&["note", "list"])["count"], 0);

    // create, update, delete
    let history = env.json(&["history", "list", "--module", "notes"]);
    assert_eq!(history["total"], 3);
    assert_eq!(history["entries"][0]["action"], "delete");
}

#[test]
fn test_missing_record_exits_with_not_found() {
    let env = Env::new();
    env.init();

    let assert = env
        .cmd()
        .args(["note", "update", "99", "--title", "Nope"])
        .assert()
        .failure()
        .code(3);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    let err: Value = serde_json::from_str(stderr.lines().last().unwrap()).unwrap();
    assert_eq!(err["error"]["code"], "RECORD_NOT_FOUND");

    env.cmd().args(["project", "delete", "5"]).assert().failure().code(3);
}

#[test]
fn test_blank_required_field_is_rejected() {
    let env = Env::new();
    env.init();

    env.cmd()
        .args(["note", "create", "   "])
        .assert()
        .failure()
        .code(4);
    assert_eq!(env.json(&["history", "list"])["total"], 0);
}

#[test]
fn test_settings_round_trip_and_reset() {
    let env = Env::new();
    env.init();

    env.json(&["settings", "set", "theme", "light"]);
    assert_eq!(env.json(&["settings", "get", "theme"])["value"], "light");

    let reset = env.json(&["settings", "reset"]);
    assert_eq!(reset["reset"], true);
    assert_eq!(env.json(&["settings", "get", "theme"])["value"], "dark");
    assert_eq!(env.json(&["settings", "get", "no_such_key"])["value"], Value::Null);
}

#[test]
fn test_backup_and_restore_round_trip() {
    let env = Env::new();
    env.init();
    let backups = env.root().join("backups");
    let backups_arg = backups.to_string_lossy().to_string();

    env.json(&["note", "create", "Keep"]);
    let created = env.json(&["backup", "create", "--dir", &backups_arg]);
    let artifact = created["path"].as_str().unwrap().to_string();
    assert!(Path::new(&artifact).exists());

    let verified = env.json(&["backup", "verify", &artifact]);
    assert_eq!(verified["sidecar_verified"], true);

    env.json(&["note", "create", "Later"]);
    assert_eq!(env.json(&["note", "list"])["count"], 2);

    let report = env.json(&["backup", "restore", &artifact]);
    assert!(Path::new(report["snapshot"].as_str().unwrap()).exists());

    let notes = env.json(&["note", "list"]);
    assert_eq!(notes["count"], 1);
    assert_eq!(notes["notes"][0]["title"], "Keep");

    let listed = env.json(&["backup", "list", "--dir", &backups_arg]);
    assert_eq!(listed["count"], 2);
}

#[test]
fn test_restore_rejects_garbage() {
    let env = Env::new();
    env.init();
    let bogus = env.root().join("bogus_backup_20260101_000000.db");
    std::fs::write(&bogus, b"not a database").unwrap();

    env.cmd()
        .arg("backup")
        .arg("restore")
        .arg(&bogus)
        .assert()
        .failure()
        .code(6);

    env.cmd()
        .args(["backup", "restore", "/no/such/backup.db"])
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_download_lifecycle() {
    let env = Env::new();
    env.init();

    let added = env.json(&["download", "add", "https://example.com/a.zip"]);
    let id = added["id"].as_i64().unwrap().to_string();
    assert_eq!(added["status"], "pending");
    assert!(!added["save_path"].as_str().unwrap().is_empty());

    env.cmd()
        .args(["download", "pause", &id])
        .assert()
        .failure()
        .code(5);

    env.json(&["download", "start", &id]);
    let done = env.json(&["download", "complete", &id]);
    assert_eq!(done["status"], "completed");
    assert_eq!(done["progress"], 100.0);
}

#[test]
fn test_project_create_scaffolds_folders() {
    let env = Env::new();
    env.init();
    let base = env.root().join("work").join("site");
    let base_arg = base.to_string_lossy().to_string();

    let project = env.json(&[
        "project", "create", "Site", &base_arg, "--type", "web", "--folder", "src", "--folder", "docs",
    ]);
    assert_eq!(project["project_type"], "web");
    assert!(base.join("src").is_dir());
    assert!(base.join("docs").is_dir());

    let web = env.json(&["project", "list", "--filter", "type:web"]);
    assert_eq!(web["count"], 1);
}

#[test]
fn test_sheet_export_writes_csv() {
    let env = Env::new();
    env.init();
    let out = env.root().join("out.csv");
    let out_arg = out.to_string_lossy().to_string();

    let sheet = env.json(&[
        "sheet", "create", "Budget", "--headers", "item,cost", "--row", "rent,900", "--row", "food,300",
    ]);
    let id = sheet["id"].as_i64().unwrap().to_string();

    env.json(&["sheet", "export", &id, "--output", &out_arg]);
    let csv = std::fs::read_to_string(&out).unwrap();
    assert_eq!(csv, "item,cost\r\nrent,900\r\nfood,300\r\n");
}

#[cfg(unix)]
#[test]
fn test_failed_command_exits_nine_and_is_not_audited() {
    let env = Env::new();
    env.init();

    let ok = env.json(&["cmd", "add", "Hello", "echo hi"]);
    let ok_id = ok["id"].as_i64().unwrap().to_string();
    let out = env.json(&["cmd", "run", &ok_id]);
    assert_eq!(out["stdout"], "hi\n");

    let bad = env.json(&["cmd", "add", "Broken", "exit 3"]);
    let bad_id = bad["id"].as_i64().unwrap().to_string();
    env.cmd().args(["cmd", "run", &bad_id]).assert().failure().code(9);

    // two creates, one successful run
    assert_eq!(env.json(&["history", "list", "--module", "commands"])["total"], 3);
}

#[test]
fn test_completions_generate() {
    let env = Env::new();
    let output = env
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .get_output()
        .clone();
    assert!(String::from_utf8_lossy(&output.stdout).contains("hub"));
}
