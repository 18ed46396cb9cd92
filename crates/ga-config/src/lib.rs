//! Group audit configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for the `underperf_group.json` analyzer config
//! - Config resolution (CLI → env → XDG → /etc → defaults)
//! - Semantic validation
//! - Named presets
//! - Config snapshots embedded in audit output

pub mod analyzer;
pub mod preset;
pub mod resolve;
pub mod snapshot;
pub mod validate;

pub use analyzer::{AnalyzerConfig, ClusterSelectionMethod, ClusteringParams, ReportSettings};
pub use preset::{get_preset, list_presets, PresetError, PresetName};
pub use resolve::{resolve_config, ConfigPaths, ConfigSource};
pub use snapshot::ConfigSnapshot;
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = ga_common::SCHEMA_VERSION;

/// A resolved, parsed and validated configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AnalyzerConfig,
    pub paths: ConfigPaths,
    pub snapshot: ConfigSnapshot,
}

/// Resolve, read, parse and validate the analyzer config.
///
/// With no file found anywhere in the resolution chain the built-in defaults
/// are used.
pub fn load_config(cli_path: Option<&std::path::Path>) -> ValidationResult<LoadedConfig> {
    let paths = resolve_config(cli_path);
    let (config, snapshot) = match &paths.config {
        Some(path) => {
            let content = std::fs::read_to_string(path).map_err(|e| {
                ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
            })?;
            let config = AnalyzerConfig::from_str(&content)?;
            validate_config(&config)?;
            let snapshot = ConfigSnapshot::new(&config, &paths, Some(&content));
            (config, snapshot)
        }
        None => {
            let config = AnalyzerConfig::default();
            let snapshot = ConfigSnapshot::new(&config, &paths, None);
            (config, snapshot)
        }
    };
    Ok(LoadedConfig {
        config,
        paths,
        snapshot,
    })
}
