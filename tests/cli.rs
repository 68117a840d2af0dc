//! CLI integration tests for templo admin commands.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use templo::auth::parse_token;
use templo::store::{SqliteStore, Store};
use templo::types::Role;

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("templo").expect("failed to find binary");
        cmd.env("NO_COLOR", "1");
        cmd
    }

    fn init(&self, email: &str) -> assert_cmd::assert::Assert {
        self.cmd()
            .args([
                "admin",
                "init",
                "--data-dir",
                &self.data_dir_str(),
                "--email",
                email,
                "--non-interactive",
            ])
            .assert()
    }

    fn store(&self) -> SqliteStore {
        SqliteStore::new(self.data_dir().join("templo.db")).expect("open store")
    }
}

#[test]
fn test_init_creates_admin_and_token_file() {
    let ctx = TestContext::new();

    ctx.init("keeper@templo.test")
        .success()
        .stdout(predicate::str::contains("Admin token"))
        .stdout(predicate::str::contains("keeper@templo.test"));

    ctx.temp_dir
        .child(".admin_token")
        .assert(predicate::str::starts_with("templo_"));
    ctx.temp_dir.child("templo.db").assert(predicate::path::exists());

    let raw = std::fs::read_to_string(ctx.data_dir().join(".admin_token")).unwrap();
    let parsed = parse_token(raw.trim()).expect("token format");

    let store = ctx.store();
    let token = store.get_token_by_lookup(parsed.lookup).unwrap().expect("token row");
    let user = store.get_user(&token.user_id).unwrap().expect("admin user");
    assert_eq!(user.role, Role::SupremeMagus);
    assert_eq!(user.email, "keeper@templo.test");
}

#[cfg(unix)]
#[test]
fn test_init_restricts_token_file_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let ctx = TestContext::new();
    ctx.init("keeper@templo.test").success();

    let mode = std::fs::metadata(ctx.data_dir().join(".admin_token"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn test_init_twice_fails() {
    let ctx = TestContext::new();
    ctx.init("keeper@templo.test").success();

    ctx.init("other@templo.test")
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn test_init_non_interactive_requires_email() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args([
            "admin",
            "init",
            "--data-dir",
            &ctx.data_dir_str(),
            "--non-interactive",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--email"));

    ctx.temp_dir.child(".admin_token").assert(predicate::path::missing());
}

#[test]
fn test_init_rejects_invalid_email() {
    let ctx = TestContext::new();

    ctx.init("not-an-email").failure();

    assert!(!ctx.store().has_admin_user().unwrap());
}

#[test]
fn test_serve_refuses_uninitialized_data_dir() {
    let ctx = TestContext::new();

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn test_serve_rejects_invalid_config_file() {
    let ctx = TestContext::new();
    ctx.init("keeper@templo.test").success();
    let config = ctx.temp_dir.child("templo.toml");
    config.write_str("unlock_threshold = 150.0\n").unwrap();

    ctx.cmd()
        .args(["serve", "--data-dir", &ctx.data_dir_str(), "--config"])
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unlock_threshold"));
}
