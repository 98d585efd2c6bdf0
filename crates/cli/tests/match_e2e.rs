//! End-to-end tests for the `trialmatch match` subcommand.
//!
//! Drives the compiled `trialmatch` binary against a fixture-backed
//! `FileDocumentStore`, following `connect_e2e.rs`'s pattern of black-box CLI
//! integration tests over a temp-directory config and fixture set.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn trialmatch() -> Command {
    Command::cargo_bin("trialmatch").expect("binary exists")
}

/// Writes `trialmatch.toml` plus one trial/clinical/genomic fixture file into
/// a fresh temp directory and returns (tempdir, config_path).
fn setup_fixtures() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("temp dir");
    let fixtures_dir = tmp.path().join("fixtures");
    fs::create_dir(&fixtures_dir).expect("fixtures dir");

    fs::write(
        fixtures_dir.join("trial.json"),
        serde_json::to_string(&json!([{
            "_id": "PN-1",
            "protocol_no": "PN-1",
            "status": "open to accrual",
            "treatment_list": {
                "step": {
                    "arm": [{"arm_suspended": "n"}],
                    "match": [
                        {"genomic": {"HUGO": "BRAF"}},
                        {"clinical": {"AGE": ">=18"}},
                    ]
                }
            }
        }]))
        .unwrap(),
    )
    .unwrap();
    fs::write(
        fixtures_dir.join("clinical.json"),
        serde_json::to_string(&json!([
            {"_id": "SID-1", "VITAL_STATUS": "alive", "BIRTH_DATE": "1970-01-01"},
        ]))
        .unwrap(),
    )
    .unwrap();
    fs::write(
        fixtures_dir.join("genomic.json"),
        serde_json::to_string(&json!([
            {"_id": "G-1", "CLINICAL_ID": "SID-1", "HUGO": "BRAF"},
        ]))
        .unwrap(),
    )
    .unwrap();

    let config_path = tmp.path().join("trialmatch.toml");
    fs::write(
        &config_path,
        format!(
            "[store]\nfixtures_dir = \"{}\"\n\n[transforms.trial_key_mappings.clinical.AGE]\nsample_value = \"age_to_birthdate_range\"\n",
            fixtures_dir.display().to_string().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    (tmp, config_path)
}

#[test]
fn match_json_reports_the_matching_trial_and_patient() {
    let (_tmp, config_path) = setup_fixtures();

    trialmatch()
        .args(["--config", config_path.to_str().unwrap(), "match", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"protocol_no\": \"PN-1\""))
        .stdout(predicate::str::contains("SID-1"));
}

#[test]
fn match_text_reports_patient_count() {
    let (_tmp, config_path) = setup_fixtures();

    trialmatch()
        .args(["--config", config_path.to_str().unwrap(), "match"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PN-1 [step] -> 1 patient(s)"))
        .stdout(predicate::str::contains("SID-1"));
}

#[test]
fn protocol_no_filter_excludes_non_matching_trials() {
    let (_tmp, config_path) = setup_fixtures();

    trialmatch()
        .args([
            "--config",
            config_path.to_str().unwrap(),
            "match",
            "--protocol-no",
            "PN-other",
            "--json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn missing_config_file_exits_with_configuration_error() {
    trialmatch()
        .args(["--config", "/nonexistent/trialmatch.toml", "match"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn unreachable_fixtures_dir_exits_with_store_connectivity_error() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("trialmatch.toml");
    fs::write(
        &config_path,
        format!(
            "[store]\nfixtures_dir = \"{}\"\n",
            tmp.path().join("missing").display()
        ),
    )
    .unwrap();

    trialmatch()
        .args(["--config", config_path.to_str().unwrap(), "match"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("store connectivity error"));
}
