// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end tests for the `mapgraph` binary.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const BASE: &str = r#"[
    {"type":"node","id":"u","loc":{"lon":-1.0,"lat":0.0}},
    {"type":"node","id":"*","loc":{"lon":0.0,"lat":0.0}},
    {"type":"node","id":"w","loc":{"lon":1.0,"lat":0.0}},
    {"type":"way","id":"=","nodes":["u","*"]},
    {"type":"way","id":"-","nodes":["*","w"]}
]"#;

fn mapgraph(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mapgraph").unwrap();
    cmd.arg("--config").arg(config_dir).env_remove("RUST_LOG");
    cmd
}

fn write_script(dir: &Path, steps: &str) -> std::path::PathBuf {
    let path = dir.join("script.json");
    fs::write(&path, format!(r#"{{"base":{BASE},"steps":{steps}}}"#)).unwrap();
    path
}

const RESTRICT: &str = r#"{"op":"perform","action":{"action":"restrict_turn",
    "turn":{"from":{"node":"u","way":"="},"via":{"node":"*"},"to":{"node":"w","way":"-"}},
    "restriction":"no_straight_on","id":"r"}}"#;

#[test]
fn replay_prints_history_and_digest() {
    let tmp = tempfile::tempdir().unwrap();
    let steps = format!(r#"[{RESTRICT},{{"op":"commit","annotation":"Added turn restriction"}}]"#);
    let script = write_script(tmp.path(), &steps);
    mapgraph(tmp.path())
        .arg("replay")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("entities 6"))
        .stdout(predicate::str::contains("> Added turn restriction"))
        .stdout(predicate::str::contains("1 created, 0 modified, 0 deleted"));
}

#[test]
fn replay_json_after_undo() {
    let tmp = tempfile::tempdir().unwrap();
    let steps = format!(r#"[{RESTRICT},{{"op":"commit","annotation":"a"}},{{"op":"undo"}}]"#);
    let script = write_script(tmp.path(), &steps);
    let output = mapgraph(tmp.path())
        .args(["replay", "--json"])
        .arg(&script)
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["entities"], 5);
    assert_eq!(report["cursor"], 0);
    assert_eq!(report["edits"][0], "a");
}

#[test]
fn replay_failure_names_the_step() {
    let tmp = tempfile::tempdir().unwrap();
    let steps = r#"[{"op":"perform","action":{"action":"restrict_turn",
        "turn":{"from":{"way":"="},"via":{},"to":{"way":"-"}},"restriction":"no_left_turn"}}]"#;
    let script = write_script(tmp.path(), steps);
    mapgraph(tmp.path())
        .arg("replay")
        .arg(&script)
        .assert()
        .failure()
        .stderr(predicate::str::contains("step 0 failed"))
        .stderr(predicate::str::contains("invalid turn description"));
}

#[test]
fn check_accepts_valid_and_rejects_dangling() {
    let tmp = tempfile::tempdir().unwrap();
    let good = tmp.path().join("good.json");
    fs::write(&good, BASE).unwrap();
    mapgraph(tmp.path())
        .arg("check")
        .arg(&good)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok 5 entities"));

    let bad = tmp.path().join("bad.json");
    fs::write(&bad, r#"[{"type":"way","id":"w","nodes":["ghost"]}]"#).unwrap();
    mapgraph(tmp.path())
        .arg("check")
        .arg(&bad)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn config_is_persisted_and_applied() {
    let tmp = tempfile::tempdir().unwrap();
    mapgraph(tmp.path())
        .args(["config", "--max-history", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_history\": 1"));
    assert!(tmp.path().join("editor.json").exists());

    let steps = r#"[
        {"op":"perform","action":{"action":"move_node","id":"u","loc":{"lon":-2.0,"lat":0.0}}},
        {"op":"commit","annotation":"first"},
        {"op":"perform","action":{"action":"move_node","id":"w","loc":{"lon":2.0,"lat":0.0}}},
        {"op":"commit","annotation":"second"}
    ]"#;
    let script = write_script(tmp.path(), steps);
    let output = mapgraph(tmp.path())
        .args(["replay", "--json"])
        .arg(&script)
        .output()
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["edits"].as_array().unwrap().len(), 1);
    assert_eq!(report["edits"][0], "second");
}

#[test]
fn missing_file_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    mapgraph(tmp.path())
        .args(["check", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open"));
}
