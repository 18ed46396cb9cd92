//! No-mock configuration validation + resolution tests.
//!
//! Covers:
//! - Loading and validating real JSON files
//! - Resolution order (CLI > env > config dir > XDG)
//! - Preset determinism

use ga_config::preset::{get_preset, list_presets, PresetName};
use ga_config::resolve::{resolve_config, ConfigSource, CONFIG_FILENAME};
use ga_config::validate::{validate_config, ValidationError};
use ga_config::{load_config, AnalyzerConfig};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &["GROUP_AUDIT_CONFIG", "GROUP_AUDIT_CONFIG_DIR", "XDG_CONFIG_HOME"];

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let saved = keys.iter().map(|key| env::var(key).ok()).collect();
        for key in keys {
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

fn write_config(dir: &Path, json: &str) -> std::path::PathBuf {
    fs::create_dir_all(dir).expect("create config dir");
    let path = dir.join(CONFIG_FILENAME);
    fs::write(&path, json).expect("write config");
    path
}

#[test]
fn test_load_valid_file() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(
        temp.path(),
        r#"{"schema_version": "1.0.0", "threshold": 0.25, "metric": "manhattan"}"#,
    );

    let config = AnalyzerConfig::from_file(&path).expect("parse config");
    validate_config(&config).expect("valid config should pass validation");
    assert_eq!(config.threshold, 0.25);
    assert_eq!(config.metric.as_str(), "manhattan");
}

#[test]
fn test_load_rejects_threshold_out_of_range() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(temp.path(), r#"{"threshold": 1.5}"#);

    let config = AnalyzerConfig::from_file(&path).expect("parse config");
    let err = validate_config(&config).expect_err("threshold 1.5 should fail validation");
    assert!(matches!(err, ValidationError::InvalidValue { .. }));
}

#[test]
fn test_load_rejects_malformed_json() {
    let temp = TempDir::new().expect("temp dir");
    let path = write_config(temp.path(), "{ not json");
    let err = AnalyzerConfig::from_file(&path).expect_err("malformed json");
    assert!(matches!(err, ValidationError::ParseError(_)));
}

#[test]
fn test_load_config_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let cli = write_config(&temp.path().join("cli"), r#"{"threshold": 0.2}"#);
        let env_path = write_config(&temp.path().join("env"), r#"{"threshold": 0.3}"#);
        env::set_var("GROUP_AUDIT_CONFIG", env_path.display().to_string());

        let loaded = load_config(Some(&cli)).expect("load");
        assert_eq!(loaded.paths.source, ConfigSource::CliArgument);
        assert_eq!(loaded.config.threshold, 0.2);
        assert_eq!(loaded.snapshot.config_source, "CLI argument");
    });
}

#[test]
fn test_resolve_config_env_over_config_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let env_path = write_config(&temp.path().join("env"), "{}");
        let config_dir = temp.path().join("config_dir");
        write_config(&config_dir, "{}");

        env::set_var("GROUP_AUDIT_CONFIG", env_path.display().to_string());
        env::set_var("GROUP_AUDIT_CONFIG_DIR", config_dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.source, ConfigSource::Environment);
        assert_eq!(paths.config.unwrap(), env_path);
    });
}

#[test]
fn test_resolve_config_dir_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let config_dir = temp.path().join("config_dir");
        let expected = write_config(&config_dir, "{}");
        env::set_var("GROUP_AUDIT_CONFIG_DIR", config_dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.source, ConfigSource::Environment);
        assert_eq!(paths.config.unwrap(), expected);
    });
}

#[test]
fn test_resolve_config_xdg_fallback() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let xdg_dir = temp.path().join("xdg");
        let expected = write_config(&xdg_dir.join("group-audit"), "{}");
        env::set_var("XDG_CONFIG_HOME", xdg_dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.source, ConfigSource::XdgConfig);
        assert_eq!(paths.config.unwrap(), expected);
    });
}

#[test]
fn test_load_config_invalid_file_errors() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let cli = write_config(temp.path(), r#"{"clustering": {"min_cluster_size": 1}}"#);
        let err = load_config(Some(&cli)).expect_err("min_cluster_size 1 is invalid");
        assert_eq!(err.code(), 11);
    });
}

#[test]
fn test_presets_are_deterministic() {
    let first = get_preset(PresetName::Conservative);
    let second = get_preset(PresetName::Conservative);
    let first_json = serde_json::to_string(&first).expect("serialize preset");
    let second_json = serde_json::to_string(&second).expect("serialize preset");
    assert_eq!(first_json, second_json);

    let presets = list_presets();
    assert!(presets
        .iter()
        .any(|p| p.name == PresetName::Conservative.as_str()));
}
