//! Integration tests for the adhere binary.
//!
//! These tests verify end-to-end behavior including:
//! - Medication and refill workflow
//! - Supply status and gap reporting
//! - Lab result logging
//! - Validation failures leaving data untouched
//! - CSV export and import

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI bound to `data_dir`, isolated from the user's real config
fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("adhere"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(data_dir);
    cmd
}

fn read_tracker(data_dir: &Path) -> Value {
    let content = fs::read_to_string(data_dir.join("tracker.json")).expect("read tracker");
    serde_json::from_str(&content).expect("parse tracker")
}

fn add_biktarvy(data_dir: &Path) {
    cli(data_dir)
        .args(["med", "add", "--name", "Biktarvy", "--start", "2025-01-01", "--supply", "30"])
        .assert()
        .success();
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("adhere"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Lab results and medication adherence tracker",
        ));
}

#[test]
fn test_add_medication_creates_tracker() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["med", "add", "--name", "Biktarvy", "--start", "2025-01-01", "--supply", "30"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Biktarvy"));

    let tracker = read_tracker(data_dir);
    let meds = tracker["medications"].as_array().unwrap();
    assert_eq!(meds.len(), 1);
    assert_eq!(meds[0]["name"], "Biktarvy");
    assert_eq!(meds[0]["refill_history"][0]["fill_date"], "2025-01-01");
    assert_eq!(meds[0]["refill_history"][0]["supply_days"], 30);
}

#[test]
fn test_empty_name_rejected_without_writing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["med", "add", "--name", "", "--start", "2025-01-01", "--supply", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid medication name"));

    assert!(!data_dir.join("tracker.json").exists());
}

#[test]
fn test_non_positive_supply_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add_biktarvy(data_dir);
    let before = fs::read_to_string(data_dir.join("tracker.json")).unwrap();

    cli(data_dir)
        .args(["med", "refill", "Biktarvy", "--date", "2025-02-01", "--supply", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid supply days"));

    cli(data_dir)
        .args(["med", "refill", "Biktarvy", "--date", "2025-02-01", "--supply", "-30"])
        .assert()
        .failure();

    let after = fs::read_to_string(data_dir.join("tracker.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_supply_past_end_of_calendar_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["med", "add", "--name", "Biktarvy", "--start", "2025-01-01", "--supply", "4000000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid supply days"));

    assert!(!data_dir.join("tracker.json").exists());
}

#[test]
fn test_refill_unknown_medication() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add_biktarvy(data_dir);

    cli(data_dir)
        .args(["med", "refill", "Descovy", "--date", "2025-02-01", "--supply", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid medication id"));
}

#[test]
fn test_refills_sorted_in_snapshot() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add_biktarvy(data_dir);

    for date in ["2025-04-01", "2025-02-01", "2025-03-01"] {
        cli(data_dir)
            .args(["med", "refill", "biktarvy", "--date", date, "--supply", "30"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Refill recorded for Biktarvy"));
    }

    let tracker = read_tracker(data_dir);
    let dates: Vec<_> = tracker["medications"][0]["refill_history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["fill_date"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(dates, vec!["2025-01-01", "2025-02-01", "2025-03-01", "2025-04-01"]);
}

#[test]
fn test_status_active_and_refill_needed() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add_biktarvy(data_dir);

    cli(data_dir)
        .args(["med", "status", "--as-of", "2025-01-31"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active: 0 days remaining"));

    cli(data_dir)
        .args(["med", "status", "--as-of", "2025-02-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Refill needed"));
}

#[test]
fn test_gaps_reported() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add_biktarvy(data_dir);

    cli(data_dir)
        .args(["med", "refill", "Biktarvy", "--date", "2025-04-01", "--supply", "90"])
        .assert()
        .success();

    cli(data_dir)
        .args(["med", "gaps", "Biktarvy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-01-31 → 2025-04-01  (60 days)"));

    cli(data_dir)
        .args(["med", "gaps", "Biktarvy", "--tolerance", "60"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No adherence gaps"));
}

#[test]
fn test_tolerance_from_config_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    add_biktarvy(data_dir);

    cli(data_dir)
        .args(["med", "refill", "Biktarvy", "--date", "2025-02-05", "--supply", "30"])
        .assert()
        .success();

    cli(data_dir)
        .args(["med", "gaps", "Biktarvy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(5 days)"));

    let config_path = data_dir.join("relaxed.toml");
    fs::write(&config_path, "[adherence]\ngap_tolerance_days = 7\n").unwrap();

    cli(data_dir)
        .args(["med", "gaps", "Biktarvy", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No adherence gaps"));
}

#[test]
fn test_unusual_supply_noted_but_accepted() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["med", "add", "--name", "Descovy", "--start", "2025-01-01", "--supply", "45"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not one of the usual supply lengths"));
}

#[test]
fn test_lab_record_and_list() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["lab", "record", "--date", "2025-02-15", "--viral-load", "800", "--cd4", "420"])
        .assert()
        .success();
    cli(data_dir)
        .args(["lab", "record", "--date", "2025-01-15", "--cd4", "350"])
        .assert()
        .success();

    let tracker = read_tracker(data_dir);
    let labs = tracker["measurements"].as_array().unwrap();
    assert_eq!(labs[0]["date"], "2025-01-15");
    assert_eq!(labs[1]["date"], "2025-02-15");

    let output = cli(data_dir)
        .args(["lab", "list"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&output);
    let newer = stdout.find("2025-02-15").unwrap();
    let older = stdout.find("2025-01-15").unwrap();
    assert!(newer < older, "expected newest first:\n{}", stdout);
}

#[test]
fn test_lab_record_without_values_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["lab", "record", "--date", "2025-01-15", "--cd4", "350"])
        .assert()
        .success();

    cli(data_dir)
        .args(["lab", "record", "--date", "2025-02-15"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid measurement"));

    let tracker = read_tracker(data_dir);
    assert_eq!(tracker["measurements"].as_array().unwrap().len(), 1);
}

#[test]
fn test_bad_date_rejected() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir)
        .args(["lab", "record", "--date", "15/01/2025", "--cd4", "350"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid date"));
}

#[test]
fn test_seed_and_status() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli(data_dir).arg("seed").assert().success();

    cli(data_dir)
        .args(["med", "status", "--as-of", "2025-05-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Biktarvy"))
        .stdout(predicate::str::contains("Active: 60 days remaining"))
        .stdout(predicate::str::contains("No adherence gaps"));

    // Refuses to clobber existing data
    cli(data_dir)
        .arg("seed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    cli(data_dir).args(["seed", "--force"]).assert().success();
}

#[test]
fn test_export_and_import() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    cli(data_dir).arg("seed").assert().success();

    let out_dir = data_dir.join("out");
    cli(data_dir)
        .arg("export")
        .arg("--out-dir")
        .arg(&out_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("5 lab results, 4 refills, 0 adherence gaps"));

    let measurements = fs::read_to_string(out_dir.join("measurements.csv")).unwrap();
    assert!(measurements.starts_with("date,viral_load_copies_per_ml,cd4_count_cells_per_mm3"));
    assert!(out_dir.join("refills.csv").exists());
    assert!(out_dir.join("gaps.csv").exists());

    // Import into a fresh tracker
    let other = setup_test_dir();
    cli(other.path())
        .args(["lab", "import"])
        .arg(out_dir.join("measurements.csv"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 5 lab results"));

    let tracker = read_tracker(other.path());
    assert_eq!(tracker["measurements"].as_array().unwrap().len(), 5);
}

#[test]
fn test_corrupted_tracker_is_not_overwritten() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    let tracker_path = data_dir.join("tracker.json");
    fs::write(&tracker_path, "{ invalid json }}}}").unwrap();

    cli(data_dir)
        .args(["med", "add", "--name", "Biktarvy", "--start", "2025-01-01", "--supply", "30"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid tracker file"));

    assert_eq!(fs::read_to_string(&tracker_path).unwrap(), "{ invalid json }}}}");
}

#[test]
fn test_status_with_no_medications() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["med", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No medications tracked"));
}
