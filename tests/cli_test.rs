//! End-to-end tests of the `ledgerlens` binary.

mod common;

use assert_cmd::Command;
use common::write_fixture;
use serde_json::Value;
use tempfile::TempDir;

fn ledgerlens(workdir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ledgerlens"));
    cmd.current_dir(workdir.path())
        .env_remove("LEDGERLENS_CONFIG")
        .env_remove("LEDGERLENS_LOG")
        .env("NO_COLOR", "1")
        .arg("--plain");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).expect("stdout is not valid JSON")
}

#[test]
fn test_variance_json() {
    let (dir, previous) = write_fixture(r#"[{"accountCode": "4010", "amount": 1000}]"#, "prev.json");
    let current = dir.path().join("cur.json");
    std::fs::write(&current, r#"[{"accountCode": "4010", "amount": 1500}]"#).unwrap();

    let json = stdout_json(
        ledgerlens(&dir)
            .args(["variance", "--format", "json", "--previous"])
            .arg(&previous)
            .arg("--current")
            .arg(&current),
    );

    assert_eq!(json["accounts"][0]["delta_percent"], 50.0);
    assert_eq!(json["accounts"][0]["severity"], "critical");
    assert_eq!(json["summary"]["critical"], 1);
}

#[test]
fn test_variance_needs_an_input() {
    let dir = TempDir::new().unwrap();
    ledgerlens(&dir).arg("variance").assert().failure();
}

#[test]
fn test_health_terminal_table() {
    let (dir, rules) = write_fixture(
        r#"[{"ruleId": "R-17", "ruleName": "Totals tie out", "passedCount": 94, "failedCount": 6, "totalTests": 100}]"#,
        "rules.json",
    );
    let output = ledgerlens(&dir)
        .arg("health")
        .arg("--rules")
        .arg(&rules)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    assert!(text.contains("Totals tie out"));
}

#[test]
fn test_filter_by_status() {
    let (dir, records) = write_fixture(
        r#"[
            {"task_id": "a", "task_type": "extraction", "status": "PENDING"},
            {"task_id": "b", "task_type": "extraction", "status": "FAILURE", "error": "x"},
            {"task_id": "c", "task_type": "extraction", "status": "FAILURE", "error": "y"}
        ]"#,
        "tasks.json",
    );
    let json = stdout_json(
        ledgerlens(&dir)
            .args(["filter", "--format", "json", "--status", "FAILURE", "--records"])
            .arg(&records),
    );
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|task| task["task_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["b", "c"]);
}

#[test]
fn test_fetch_file_assembles_all_pages() {
    let items: Vec<u32> = (0..2500).collect();
    let (dir, file) = write_fixture(&serde_json::to_string(&items).unwrap(), "items.json");
    let json = stdout_json(
        ledgerlens(&dir)
            .args(["fetch", "--format", "json", "--page-size", "1000", "--file"])
            .arg(&file),
    );
    assert_eq!(json["complete"], true);
    assert_eq!(json["received"], 2500);
    assert_eq!(json["pages"], 3);
}

#[test]
fn test_explicit_invalid_config_fails() {
    let (dir, config) = write_fixture("[paging]\npage_size = 0\n", "bad.toml");
    let items = dir.path().join("items.json");
    std::fs::write(&items, "[1, 2, 3]").unwrap();
    ledgerlens(&dir)
        .arg("--config")
        .arg(&config)
        .args(["fetch", "--file"])
        .arg(&items)
        .assert()
        .failure();
}

#[test]
fn test_fetch_help_documents_unbounded_watch() {
    let dir = TempDir::new().unwrap();
    let output = ledgerlens(&dir)
        .args(["fetch", "--help"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let help = String::from_utf8(output).unwrap();
    assert!(help.contains("runs until killed unless --refreshes is set"));
}
