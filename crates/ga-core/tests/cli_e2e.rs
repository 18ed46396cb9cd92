//! End-to-end CLI tests for ga-core.
//!
//! These tests drive the real binary: generate a synthetic dataset with
//! `synth`, audit it, and check payloads on stdout and exit codes.

use assert_cmd::Command;
use ga_config::AnalyzerConfig;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Get a Command for the ga-core binary with config discovery isolated.
fn ga_core(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ga-core").expect("ga-core binary should exist");
    cmd.env_remove("GROUP_AUDIT_CONFIG")
        .env("GROUP_AUDIT_CONFIG_DIR", dir)
        .env("XDG_CONFIG_HOME", dir)
        .env("RUST_LOG", "off");
    cmd
}

fn synth(dir: &TempDir, name: &str, extra: &[&str]) -> PathBuf {
    let path = dir.path().join(name);
    ga_core(dir.path())
        .args(["synth", "--output"])
        .arg(&path)
        .args(extra)
        .assert()
        .success();
    path
}

fn write_config(dir: &TempDir, config: &AnalyzerConfig) -> PathBuf {
    let path = dir.path().join("underperf_group.json");
    fs::write(&path, config.to_json().expect("serialize config")).expect("write config");
    path
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

// ============================================================================
// synth + audit
// ============================================================================

mod audit {
    use super::*;

    #[test]
    fn clean_dataset_exits_zero() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "clean.json", &[]);

        let output = ga_core(dir.path())
            .args(["audit", "--input"])
            .arg(&data)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));

        let json = stdout_json(&output);
        assert_eq!(json["summary"]["issue_type"], "underperf_group");
        assert_eq!(json["summary"]["num_issues"], 0);
        assert_eq!(json["summary"]["score"], 1.0);
        assert_eq!(json["num_examples"], 200);
        assert_eq!(json["exit_code_name"], "OK_CLEAN");
        assert!(json["issues"].is_null());
    }

    #[test]
    fn swapped_blob_exits_one() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "swapped.json", &["--swap-class", "0"]);

        let output = ga_core(dir.path())
            .args(["audit", "--threshold", "0.2", "--include-issues", "--input"])
            .arg(&data)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(1));

        let json = stdout_json(&output);
        assert_eq!(json["summary"]["num_issues"], 50);
        let flags = json["issues"]["is_underperf_group_issue"].as_array().unwrap();
        assert_eq!(flags.len(), 200);
        assert!(flags[..50].iter().all(|f| f.as_bool() == Some(true)));
        assert!(flags[50..].iter().all(|f| f.as_bool() == Some(false)));
        assert_eq!(json["config"]["summary"]["threshold"], 0.2);
    }

    #[test]
    fn threshold_from_config_file() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "swapped.json", &["--swap-class", "0"]);
        let config = write_config(
            &dir,
            &AnalyzerConfig {
                threshold: 0.2,
                ..AnalyzerConfig::default()
            },
        );

        ga_core(dir.path())
            .arg("--config")
            .arg(&config)
            .args(["audit", "--format", "summary", "--input"])
            .arg(&data)
            .assert()
            .code(1)
            .stdout(predicate::str::contains("50 of 200 examples flagged"));
    }

    #[test]
    fn markdown_contains_report_banner() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "swapped.json", &["--swap-class", "0"]);

        ga_core(dir.path())
            .args(["audit", "-f", "md", "--threshold", "0.2", "--input"])
            .arg(&data)
            .assert()
            .code(1)
            .stdout(predicate::str::contains(" underperf_group issues "))
            .stdout(predicate::str::contains(
                "Number of examples with this issue: 50",
            ));
    }

    #[test]
    fn exitcode_format_prints_nothing() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "clean.json", &[]);

        ga_core(dir.path())
            .args(["audit", "-f", "exitcode", "--input"])
            .arg(&data)
            .assert()
            .code(0)
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn reads_dataset_from_stdin() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "clean.json", &[]);
        let content = fs::read_to_string(&data).unwrap();

        ga_core(dir.path())
            .args(["audit", "-f", "summary", "--input", "-"])
            .write_stdin(content)
            .assert()
            .code(0)
            .stdout(predicate::str::contains("0 of 200 examples flagged"));
    }

    #[test]
    fn precomputed_cluster_ids() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny.json");
        fs::write(
            &path,
            r#"{
                "pred_probs": [[0.9, 0.1], [0.8, 0.2], [0.1, 0.9], [0.9, 0.1]],
                "labels": [0, 0, 1, 1],
                "cluster_ids": [0, 0, 1, 1]
            }"#,
        )
        .unwrap();

        let output = ga_core(dir.path())
            .args(["audit", "--threshold", "0.8", "--include-issues", "--input"])
            .arg(&path)
            .output()
            .unwrap();
        // global 0.675; cluster 0 mean 0.85 -> 1.0; cluster 1 mean 0.5 -> 0.74
        assert_eq!(output.status.code(), Some(1));
        let json = stdout_json(&output);
        assert_eq!(json["info"]["clustering_performed"], false);
        assert_eq!(
            json["issues"]["is_underperf_group_issue"],
            serde_json::json!([false, false, true, true])
        );
    }
}

// ============================================================================
// Error exit codes
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn malformed_dataset_is_input_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();

        ga_core(dir.path())
            .args(["audit", "--input"])
            .arg(&path)
            .assert()
            .code(12)
            .stderr(predicate::str::contains("\"suggested_action\""));
    }

    #[test]
    fn ragged_features_are_input_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragged.json");
        fs::write(
            &path,
            r#"{
                "features": [[0.0, 1.0], [2.0]],
                "pred_probs": [[0.9, 0.1], [0.2, 0.8]],
                "labels": [0, 1]
            }"#,
        )
        .unwrap();

        ga_core(dir.path())
            .args(["audit", "--input"])
            .arg(&path)
            .assert()
            .code(12);
    }

    #[test]
    fn bad_cluster_id_is_input_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.json");
        fs::write(
            &path,
            r#"{
                "pred_probs": [[0.9, 0.1], [0.2, 0.8]],
                "labels": [0, 1],
                "cluster_ids": [0, -2]
            }"#,
        )
        .unwrap();

        let output = ga_core(dir.path())
            .args(["audit", "--input"])
            .arg(&path)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(12));
        let err: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
        assert_eq!(err["code"], 26);
        assert_eq!(err["category"], "input");
        assert_eq!(err["context"]["cluster_id"], -2);
    }

    #[test]
    fn unknown_issue_type_is_args_error() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "clean.json", &[]);

        ga_core(dir.path())
            .args(["audit", "--issue-type", "outlier", "--input"])
            .arg(&data)
            .assert()
            .code(10);
    }

    #[test]
    fn invalid_threshold_is_config_error() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "clean.json", &[]);

        ga_core(dir.path())
            .args(["audit", "--threshold", "1.5", "--input"])
            .arg(&data)
            .assert()
            .code(11);
    }

    #[test]
    fn unknown_preset_is_config_error() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "clean.json", &[]);

        let output = ga_core(dir.path())
            .args(["audit", "--preset", "bogus", "--input"])
            .arg(&data)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(11));
        let err: Value = serde_json::from_slice(&output.stderr).expect("stderr should be JSON");
        assert_eq!(err["category"], "config");
        assert!(err["message"].as_str().unwrap().contains("bogus"));
    }

    #[test]
    fn missing_config_file_is_config_error() {
        let dir = tempdir().unwrap();
        let data = synth(&dir, "clean.json", &[]);

        ga_core(dir.path())
            .arg("--config")
            .arg(dir.path().join("nope.json"))
            .args(["audit", "--input"])
            .arg(&data)
            .assert()
            .code(11);
    }

    #[test]
    fn unknown_subcommand_fails() {
        let dir = tempdir().unwrap();
        ga_core(dir.path())
            .arg("nonexistent-command")
            .assert()
            .failure()
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn synth_rejects_too_many_blobs() {
        let dir = tempdir().unwrap();
        ga_core(dir.path())
            .args(["synth", "--blobs", "9"])
            .assert()
            .code(10);
    }
}

// ============================================================================
// config / schema / version
// ============================================================================

mod config {
    use super::*;

    #[test]
    fn validate_good_file() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, &AnalyzerConfig::default());

        let output = ga_core(dir.path())
            .args(["config", "validate"])
            .arg(&path)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));
        assert_eq!(stdout_json(&output)["status"], "valid");
    }

    #[test]
    fn validate_bad_file_exits_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("underperf_group.json");
        fs::write(&path, r#"{"threshold": "high"}"#).unwrap();

        ga_core(dir.path())
            .args(["config", "validate"])
            .arg(&path)
            .assert()
            .code(11);
    }

    #[test]
    fn show_defaults() {
        let dir = tempdir().unwrap();
        let output = ga_core(dir.path())
            .args(["config", "show", "--defaults"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));
        let json = stdout_json(&output);
        assert_eq!(json["config"]["threshold"], 0.1);
        assert_eq!(json["config"]["metric"], "euclidean");
    }

    #[test]
    fn presets_are_listed() {
        let dir = tempdir().unwrap();
        let output = ga_core(dir.path())
            .args(["config", "presets"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));
        let json = stdout_json(&output);
        assert!(!json["presets"].as_array().unwrap().is_empty());
    }
}

mod schema {
    use super::*;

    #[test]
    fn list_includes_dataset() {
        let dir = tempdir().unwrap();
        ga_core(dir.path())
            .args(["schema", "--list", "-f", "summary"])
            .assert()
            .success()
            .stdout(predicate::str::contains("DatasetFile"));
    }

    #[test]
    fn dataset_schema_is_json() {
        let dir = tempdir().unwrap();
        let output = ga_core(dir.path())
            .args(["schema", "DatasetFile"])
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(0));
        let json = stdout_json(&output);
        assert!(json["properties"]["pred_probs"].is_object());
    }

    #[test]
    fn unknown_schema_is_args_error() {
        let dir = tempdir().unwrap();
        ga_core(dir.path())
            .args(["schema", "NoSuchType"])
            .assert()
            .code(10);
    }
}

#[test]
fn version_reports_schema_version() {
    let dir = tempdir().unwrap();
    let output = ga_core(dir.path()).arg("version").output().unwrap();
    assert_eq!(output.status.code(), Some(0));
    let json = stdout_json(&output);
    assert_eq!(json["schema_version"], ga_common::SCHEMA_VERSION);
    assert_eq!(json["ga_core_version"], env!("CARGO_PKG_VERSION"));
}
