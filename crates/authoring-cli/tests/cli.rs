// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn authoring(config: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("authoring").unwrap();
    cmd.arg("--config-dir").arg(config.path());
    cmd
}

#[test]
fn schema_prints_rule_table() {
    let dir = TempDir::new().unwrap();
    authoring(&dir)
        .args(["schema", "--type", "module"])
        .assert()
        .success()
        .stdout(predicate::str::contains("elements"))
        .stdout(predicate::str::contains("lesson.1"));
}

#[test]
fn schema_json_is_machine_readable() {
    let dir = TempDir::new().unwrap();
    let out = authoring(&dir)
        .args(["--format", "json", "schema", "--type", "unit"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value[0]["source"], "unit.1");
}

#[test]
fn schema_groups_lists_group_names() {
    let dir = TempDir::new().unwrap();
    authoring(&dir)
        .args(["schema", "--groups"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gradebookCategory"));
}

#[test]
fn unknown_type_is_rejected() {
    let dir = TempDir::new().unwrap();
    authoring(&dir)
        .args(["schema", "--type", "quiz.9"])
        .assert()
        .failure();
}

#[test]
fn prefs_are_written_on_first_use() {
    let dir = TempDir::new().unwrap();
    authoring(&dir)
        .arg("prefs")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8080"));
    assert!(dir.path().join("authoring_editor.json").exists());
}

#[test]
fn api_flag_overrides_saved_prefs() {
    let dir = TempDir::new().unwrap();
    let out = authoring(&dir)
        .args(["--format", "json", "--api", "https://lms.example", "prefs"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["api_base_url"], "https://lms.example");
}

#[test]
fn show_fails_cleanly_when_server_is_down() {
    let dir = TempDir::new().unwrap();
    authoring(&dir)
        .args(["--api", "http://127.0.0.1:9", "show", "-b", "1", "m1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not load m1"));
}

#[test]
fn edit_requires_an_assignment() {
    let dir = TempDir::new().unwrap();
    authoring(&dir)
        .args(["edit", "-b", "1", "m1"])
        .assert()
        .failure();
}
