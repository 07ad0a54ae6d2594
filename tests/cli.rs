//! CLI integration tests for hallpass.
//!
//! Each test uses an isolated temp directory for the database, ensuring tests
//! can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::PathBuf;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;

const OPERATOR: &str = "100";

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.temp_dir.path().join("hallpass.db")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("hallpass").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env("HALLPASS_DB", self.db_path())
            .env("HALLPASS_OVERRIDE_USER", OPERATOR)
            .env_remove("HALLPASS_API_TOKEN");
        cmd
    }

    fn init(&self) -> assert_cmd::assert::Assert {
        self.cmd().args(["admin", "init"]).assert()
    }

    fn group(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd().arg("group").args(args).assert()
    }

    fn show_json(&self, name: &str) -> Value {
        let output = self
            .cmd()
            .args(["group", "show", name, "--json"])
            .output()
            .expect("failed to run command");

        serde_json::from_slice(&output.stdout).expect("failed to parse JSON")
    }
}

#[test]
fn test_init_bootstraps_admin_group() {
    let ctx = TestContext::new();

    ctx.init()
        .success()
        .stdout(predicate::str::contains("protected membership in \"admin\""));
    ctx.temp_dir.child("hallpass.db").assert(predicate::path::exists());

    let details = ctx.show_json("admin");
    assert_eq!(details["members"][0]["user_id"], 100);
    assert_eq!(details["members"][0]["protected"], true);
    assert_eq!(details["can_manage"][0], "admin");
}

#[test]
fn test_init_is_repeatable() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.init().success();

    let details = ctx.show_json("admin");
    assert_eq!(details["members"].as_array().unwrap().len(), 1);
}

#[test]
fn test_init_requires_override_user() {
    let ctx = TestContext::new();
    ctx.cmd()
        .env_remove("HALLPASS_OVERRIDE_USER")
        .args(["admin", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("override user"));
}

#[test]
fn test_check_reports_decision() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.group(&["grant", "admin", "autolabel", "add"]).success();
    ctx.group(&["create", "mods", "--parent", "admin"]).success();
    ctx.group(&["add-member", "mods", "2"]).success();

    ctx.cmd()
        .args(["check", "100", "autolabel", "add"])
        .assert()
        .success()
        .stdout(predicate::str::contains("may run \"autolabel add\""));

    ctx.cmd()
        .args(["check", "2", "autolabel", "add"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Only members of groups _admin_ may run that command.",
        ));
}

#[test]
fn test_check_json_output() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.group(&["grant", "admin", "prioritize"]).success();

    let output = ctx
        .cmd()
        .args(["check", "100", "prioritize", "--json"])
        .output()
        .expect("failed to run command");
    let decision: Value = serde_json::from_slice(&output.stdout).expect("failed to parse JSON");
    assert_eq!(decision["decision"], "allowed");
    assert_eq!(decision["group"], "admin");
}

#[test]
fn test_group_changes_respect_reach() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.group(&["create", "mods", "--parent", "admin"]).success();
    ctx.group(&["add-member", "mods", "2"]).success();

    ctx.group(&["add-member", "admin", "3", "--as", "2"])
        .failure()
        .stderr(predicate::str::contains("may not manage group admin"));

    ctx.group(&["remove-member", "admin", "100", "--as", "2"])
        .failure()
        .stderr(predicate::str::contains("protected"));

    ctx.group(&["add-member", "mods", "2"])
        .failure()
        .stderr(predicate::str::contains("already a member"));

    ctx.group(&["remove-member", "mods", "2"]).success();
    let details = ctx.show_json("mods");
    assert!(details["members"].as_array().unwrap().is_empty());
}

#[test]
fn test_group_list_and_manage() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.group(&["create", "mods", "--parent", "admin"]).success();
    ctx.group(&["create", "helpers", "--parent", "mods"]).success();
    ctx.group(&["manage", "admin", "helpers"]).success();

    ctx.group(&["list"])
        .success()
        .stdout(predicate::str::contains("admin"))
        .stdout(predicate::str::contains("helpers"))
        .stdout(predicate::str::contains("mods"));

    let details = ctx.show_json("helpers");
    assert_eq!(details["is_managed_by"], serde_json::json!(["admin", "mods"]));
}

#[test]
fn test_group_unmanage_and_delete() {
    let ctx = TestContext::new();
    ctx.init().success();
    ctx.group(&["create", "mods", "--parent", "admin"]).success();
    ctx.group(&["create", "helpers", "--parent", "mods"]).success();

    ctx.group(&["unmanage", "mods", "helpers"])
        .success()
        .stdout(predicate::str::contains("no longer manages"));
    ctx.group(&["unmanage", "mods", "helpers"])
        .success()
        .stdout(predicate::str::contains("did not manage"));
    assert!(ctx.show_json("mods")["can_manage"].as_array().unwrap().is_empty());

    ctx.group(&["delete", "mods"])
        .success()
        .stdout(predicate::str::contains("Deleted group \"mods\""));
    ctx.group(&["show", "mods"])
        .failure()
        .stderr(predicate::str::contains("group not found: mods"));
    assert!(ctx.show_json("admin")["can_manage"]
        .as_array()
        .unwrap()
        .iter()
        .all(|g| g != "mods"));
}

#[test]
fn test_config_file_is_read() {
    let ctx = TestContext::new();
    let config = ctx.temp_dir.child("hallpass.toml");
    config
        .write_str(&format!(
            "[authority]\noverride_user = 7\n\n[store]\npath = \"{}\"\n",
            ctx.temp_dir.path().join("other.db").display()
        ))
        .unwrap();

    Command::cargo_bin("hallpass")
        .expect("failed to find binary")
        .env_remove("HALLPASS_DB")
        .env_remove("HALLPASS_OVERRIDE_USER")
        .args(["--config"])
        .arg(config.path())
        .args(["admin", "init", "--group", "ops"])
        .assert()
        .success()
        .stdout(predicate::str::contains("User 7"));

    ctx.temp_dir.child("other.db").assert(predicate::path::exists());
}
