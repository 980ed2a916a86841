//! Integration tests for the medrec binary.
//!
//! These tests verify end-to-end behavior including:
//! - Parsing orders in each output format
//! - Days-supply and refill output
//! - Record prefill and batch export
//! - Configuration and error exits

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medrec"));
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Medication order parser and days-supply calculator",
        ));
}

#[test]
fn test_parse_text_output() {
    cli()
        .args(["parse", "Metformin 500mg PO BID"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name:      Metformin"))
        .stdout(predicate::str::contains("dosage:    500mg"))
        .stdout(predicate::str::contains("frequency: BID"))
        .stdout(predicate::str::contains("route:     PO"));
}

#[test]
fn test_parse_joins_unquoted_words() {
    cli()
        .args(["parse", "Ibuprofen", "400mg", "q6h", "PRN"])
        .assert()
        .success()
        .stdout(predicate::str::contains("frequency: Q6H PRN"));
}

#[test]
fn test_parse_json_output() {
    let output = cli()
        .args(["parse", "--format", "json", "Amlodipine 5mg OD #30"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "Amlodipine");
    assert_eq!(json["dosage"], "5mg");
    assert_eq!(json["frequency"], "OD");
    assert_eq!(json["route"], "PO");
    assert_eq!(json["quantity"], 30);
}

#[test]
fn test_parse_csv_output() {
    cli()
        .args(["parse", "--format", "csv", "Insulin glargine 10 units SC at bedtime"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("name,dosage,frequency,route,quantity"))
        .stdout(predicate::str::contains("Insulin glargine,10 units,QHS,SC,"));
}

#[test]
fn test_parse_rejects_unknown_format() {
    cli()
        .args(["parse", "--format", "yaml", "Aspirin 81mg OD"])
        .assert()
        .failure();
}

#[test]
fn test_supply_days() {
    cli()
        .args(["supply", "--quantity", "30", "--frequency", "Q6H"])
        .assert()
        .success()
        .stdout("7.5\n");
}

#[test]
fn test_supply_unknown() {
    cli()
        .args(["supply", "--quantity", "10", "--frequency", "each HD x10 doses"])
        .assert()
        .success()
        .stdout("unknown\n");
}

#[test]
fn test_supply_with_refill_date() {
    cli()
        .args([
            "supply",
            "--quantity",
            "30",
            "--frequency",
            "BID",
            "--start",
            "2024-01-01",
        ])
        .assert()
        .success()
        .stdout("15\nrefill: 2024-01-16\n");
}

#[test]
fn test_supply_rounding_from_config() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[refill]\nrounding = \"ceil\"\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config_path)
        .args([
            "supply",
            "--quantity",
            "30",
            "--frequency",
            "Q6H",
            "--start",
            "2024-01-01",
        ])
        .assert()
        .success()
        .stdout("7.5\nrefill: 2024-01-09\n");
}

#[test]
fn test_supply_rejects_bad_start_date() {
    cli()
        .args([
            "supply",
            "--quantity",
            "30",
            "--frequency",
            "BID",
            "--start",
            "01/02/2024",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid start date"));
}

#[test]
fn test_record_json() {
    let output = cli()
        .args([
            "record",
            "Acetaminophen 500mg PRN",
            "--quantity",
            "20",
            "--start",
            "2024-05-01",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["name"], "Acetaminophen");
    assert_eq!(json["status"], "prn");
    assert_eq!(json["quantity"], 20);
    assert_eq!(json["startDate"], "2024-05-01");
    assert!(json.get("refillDate").is_none());
    assert!(json["id"].as_str().is_some());
}

#[test]
fn test_record_refill_from_dispense_quantity() {
    cli()
        .args(["record", "Amlodipine 5mg OD #30", "--start", "2024-03-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"refillDate\": \"2024-03-31\""));
}

#[test]
fn test_batch_csv_to_file() {
    let temp_dir = setup_test_dir();
    let input = temp_dir.path().join("orders.txt");
    let output = temp_dir.path().join("out").join("records.csv");
    fs::write(
        &input,
        "Metformin 500mg PO BID #60\n\n   \nCeftriaxone 1g IV OD #7\nVitamin D supplement\n",
    )
    .unwrap();

    cli()
        .arg("batch")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .args(["--start", "2024-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 3 records"));

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains("Metformin,500mg,BID,PO,active,2024-01-01,60,30,2024-01-31"));
    assert!(lines[2].contains("Ceftriaxone,1g,OD,IV,active,2024-01-01,7,7,2024-01-08"));
    assert!(lines[3].contains("Vitamin D supplement,,,PO,active,2024-01-01,,unknown,"));
}

#[test]
fn test_batch_json_to_stdout() {
    let temp_dir = setup_test_dir();
    let input = temp_dir.path().join("orders.txt");
    fs::write(&input, "Salbutamol 2.5mg via nebulizer q4h\n").unwrap();

    let output = cli()
        .arg("batch")
        .arg("--input")
        .arg(&input)
        .args(["--format", "json", "--start", "2024-01-01"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["route"], "INH");
    assert_eq!(records[0]["frequency"], "Q4H");
}

#[test]
fn test_batch_missing_input_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("batch")
        .arg("--input")
        .arg(temp_dir.path().join("missing.txt"))
        .assert()
        .failure();
}

#[test]
fn test_bad_config_fails() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[logging]\nlevel = \"chatty\"\n").unwrap();

    cli()
        .arg("--config")
        .arg(&config_path)
        .args(["parse", "Aspirin 81mg OD"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown log level"));
}
