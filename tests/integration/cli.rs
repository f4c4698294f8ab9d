//! Integration tests for the `acq` binary.
//!
//! Every test runs in its own temp directory with API keys removed from the
//! environment, so nothing here touches the network.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn acq_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("acq").expect("Failed to find acq binary");
    cmd.current_dir(dir)
        .env_remove("ACQ_CATALOG_KEY")
        .env_remove("ACQ_RECOMMENDATION_KEY")
        .env_remove("ACQ_STATE_DIR")
        .env("RUST_LOG", "warn");
    cmd
}

fn book_json(id: &str, category: &str, price: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Title {id}"),
        "author": "저자",
        "publisher": "출판사",
        "pub_date": "2026-09-01",
        "cover": "",
        "description": "",
        "isbn13": "",
        "price_standard": price,
        "price_sales": price,
        "link": "",
        "category_name": category,
    })
}

fn write_state(dir: &Path, file: &str, value: &Value) {
    fs::write(dir.join(file), serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

fn small_settings() -> Value {
    json!({
        "total_budget": 100000,
        "start_date": "2026-01-01",
        "end_date": "2026-12-31",
        "allocations": [
            { "id": "lit", "name": "문학", "percentage": 10.0 },
            { "id": "other", "name": "기타", "percentage": 90.0 }
        ]
    })
}

#[test]
fn test_budget_reports_overspent_category() {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("state");
    fs::create_dir_all(&state).unwrap();
    write_state(&state, "settings.json", &small_settings());
    write_state(
        &state,
        "board.json",
        &json!({ "confirmed": [book_json("b1", "국내도서>소설/시/희곡>한국소설", 30000)] }),
    );

    let output = acq_cmd(temp_dir.path())
        .arg("--state-dir")
        .arg(&state)
        .arg("--json")
        .arg("budget")
        .output()
        .unwrap();
    assert!(output.status.success());

    let status = stdout_json(&output);
    assert_eq!(status["total_used"], 30000);
    assert_eq!(status["alert_level"], "safe");
    let lit = &status["category_statuses"][0];
    assert_eq!(lit["id"], "lit");
    assert_eq!(lit["allocated_amount"], 10000);
    assert_eq!(lit["usage_percentage"], 300.0);
    assert_eq!(lit["is_exceeded"], true);
    assert_eq!(lit["alert_level"], "danger");
}

#[test]
fn test_budget_init_writes_default_settings() {
    let temp_dir = TempDir::new().unwrap();

    acq_cmd(temp_dir.path())
        .args(["--state-dir", "state", "budget", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Acquisition Budget"))
        .stdout(predicate::str::contains("문학"));

    let settings: Value =
        serde_json::from_str(&fs::read_to_string(temp_dir.path().join("state/settings.json")).unwrap())
            .unwrap();
    assert_eq!(settings["total_budget"], 10000000);
    assert_eq!(settings["allocations"].as_array().unwrap().len(), 7);
}

#[test]
fn test_triage_flow_persists_board() {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("state");
    fs::create_dir_all(&state).unwrap();
    write_state(&state, "settings.json", &small_settings());
    write_state(
        &state,
        "board.json",
        &json!({ "discovery": [
            book_json("a", "국내도서>에세이", 12000),
            book_json("b", "국내도서>요리", 8000)
        ]}),
    );

    for args in [["shortlist", "a"], ["approve", "a"], ["shortlist", "b"]] {
        acq_cmd(temp_dir.path())
            .arg("--state-dir")
            .arg(&state)
            .args(args)
            .assert()
            .success();
    }

    let board: Value =
        serde_json::from_str(&fs::read_to_string(state.join("board.json")).unwrap()).unwrap();
    assert_eq!(board["discovery"].as_array().unwrap().len(), 0);
    assert_eq!(board["review"][0]["id"], "b");
    assert_eq!(board["confirmed"][0]["id"], "a");
    assert_eq!(board["confirmed"][0]["workflow_stage"], "confirmed");

    let output = acq_cmd(temp_dir.path())
        .arg("--state-dir")
        .arg(&state)
        .args(["--json", "budget"])
        .output()
        .unwrap();
    let status = stdout_json(&output);
    assert_eq!(status["total_used"], 12000);
    assert_eq!(status["category_statuses"][0]["used_amount"], 12000);
    assert_eq!(status["category_statuses"][0]["alert_level"], "danger");
}

#[test]
fn test_approve_requires_review() {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("state");
    fs::create_dir_all(&state).unwrap();
    write_state(
        &state,
        "board.json",
        &json!({ "discovery": [book_json("a", "국내도서>소설", 12000)] }),
    );

    acq_cmd(temp_dir.path())
        .arg("--state-dir")
        .arg(&state)
        .args(["approve", "a"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in review"));
}

#[test]
fn test_fetch_without_catalog_key_is_empty() {
    let temp_dir = TempDir::new().unwrap();

    let output = acq_cmd(temp_dir.path())
        .args(["--state-dir", "state", "--json", "fetch", "--source", "bestseller"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!([]));
    assert!(temp_dir.path().join("state/board.json").exists());
}

#[test]
fn test_recommended_without_key_fails() {
    let temp_dir = TempDir::new().unwrap();

    acq_cmd(temp_dir.path())
        .args(["--state-dir", "state", "fetch", "--source", "recommended"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("recommendation API key"));
}

#[test]
fn test_config_file_and_check_keys_without_keys() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("acq.toml"), "state_dir = \"from-config\"\n").unwrap();

    acq_cmd(temp_dir.path())
        .args(["--json", "fetch"])
        .assert()
        .success();
    assert!(temp_dir.path().join("from-config/board.json").exists());

    acq_cmd(temp_dir.path())
        .arg("check-keys")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no API keys configured"));
}
