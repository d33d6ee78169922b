//! Command-line behaviour of the `app-forge` binary.

mod common;

use assert_cmd::Command;
use common::demo_manifest_path;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_build_writes_artifacts() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("artifacts");

    cmd.arg("build")
        .arg(demo_manifest_path())
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Built StateExample"));

    for name in ["approval.teal", "clear.teal", "contract.json", "application.json"] {
        assert!(out.join(name).exists(), "{} missing", name);
    }
    let approval = std::fs::read_to_string(out.join("approval.teal")).unwrap();
    assert!(approval.starts_with("#pragma version 8"));
}

#[test]
fn test_build_json_summary() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    let temp_dir = TempDir::new().unwrap();

    let output = cmd
        .arg("build")
        .arg(demo_manifest_path())
        .arg("--out")
        .arg(temp_dir.path())
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["name"], "StateExample");
    assert_eq!(summary["methods"], 9);
    assert_eq!(summary["files"].as_array().unwrap().len(), 4);
}

#[test]
fn test_spec_prints_document() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    let output = cmd.arg("spec").arg(demo_manifest_path()).output().unwrap();
    assert!(output.status.success());

    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(doc["source"]["approval"].is_string());
    assert_eq!(
        doc["hints"]["get_reserved_account_state_val"]["default_arguments"]["k"]["source"],
        "constant"
    );
    assert_eq!(doc["schema"]["global"]["reserved_app_value"]["max_keys"], 63);
}

#[test]
fn test_program_version_override() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    cmd.arg("--program-version")
        .arg("7")
        .arg("spec")
        .arg(demo_manifest_path())
        .arg("--programs")
        .assert()
        .success()
        .stdout(predicate::str::contains("#pragma version 7"));
}

#[test]
fn test_unsupported_program_version_fails() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    cmd.arg("--program-version")
        .arg("2")
        .arg("routes")
        .arg(demo_manifest_path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("program version 2 outside supported range"));
}

#[test]
fn test_routes_lists_selectors() {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    cmd.arg("routes")
        .arg(demo_manifest_path())
        .assert()
        .success()
        .stdout(predicate::str::contains("set_app_state_val(string)void"))
        .stdout(predicate::str::contains("opt_in"));
}

#[test]
fn test_invalid_manifest_reports_path() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("broken.json");
    std::fs::write(&manifest, "{\"name\": \"X\", \"members\": [{\"name\": \"m\", \"kind\": \"nope\"}]}").unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    cmd.arg("spec")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid application manifest"));
}

#[test]
fn test_spec_with_pending_sub_artifact_names_connection() {
    let temp_dir = TempDir::new().unwrap();
    let manifest = temp_dir.path().join("parent.json");
    std::fs::write(
        &manifest,
        r#"{"name": "Parent", "members": [
            {"name": "child", "kind": "logic_signature", "program": {"pending": {"source": "int 1"}}}
        ]}"#,
    )
    .unwrap();

    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("app-forge").unwrap();
    cmd.arg("spec")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing compiler connection"))
        .stderr(predicate::str::contains("child"));
}
