//! Configuration snapshots for audit reproducibility.
//!
//! A snapshot captures the exact configuration state at the start of a run so
//! that a report can be traced back to the parameters that produced it.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::analyzer::AnalyzerConfig;
use crate::resolve::ConfigPaths;

/// A frozen snapshot of configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSnapshot {
    /// When this snapshot was taken.
    pub timestamp: DateTime<Utc>,

    /// Hostname where snapshot was taken.
    #[serde(default)]
    pub hostname: Option<String>,

    /// Schema version of the configuration.
    pub schema_version: String,

    /// Path where the config was loaded from.
    #[serde(default)]
    pub config_path: Option<String>,

    /// Source of the configuration.
    pub config_source: String,

    /// SHA-256 of the effective configuration.
    ///
    /// Hashes the file content when one was read, otherwise the canonical
    /// JSON of the in-memory config, so CLI overrides change the hash.
    pub config_hash: String,

    /// Key configuration values for quick reference.
    pub summary: ConfigSummary,
}

/// Summary of key configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConfigSummary {
    pub threshold: f64,
    pub metric: String,
    pub min_cluster_size: usize,
    pub min_samples: usize,
    pub cluster_selection_method: String,
    pub allow_single_cluster: bool,
}

impl ConfigSummary {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        ConfigSummary {
            threshold: config.threshold,
            metric: config.metric.to_string(),
            min_cluster_size: config.clustering.min_cluster_size,
            min_samples: config.clustering.effective_min_samples(),
            cluster_selection_method: config.clustering.cluster_selection_method.to_string(),
            allow_single_cluster: config.clustering.allow_single_cluster,
        }
    }
}

impl ConfigSnapshot {
    /// Create a new snapshot. `raw_json` is the file content, if a file was read.
    pub fn new(config: &AnalyzerConfig, paths: &ConfigPaths, raw_json: Option<&str>) -> Self {
        let config_hash = match raw_json {
            Some(content) => hash_content(content),
            None => canonical_hash(config),
        };

        ConfigSnapshot {
            timestamp: Utc::now(),
            hostname: hostname::get()
                .ok()
                .map(|h| h.to_string_lossy().to_string()),
            schema_version: config.schema_version.clone(),
            config_path: paths.config.as_ref().map(|p| p.display().to_string()),
            config_source: paths.source.to_string(),
            config_hash,
            summary: ConfigSummary::from_config(config),
        }
    }

    /// Re-derive the snapshot after in-memory overrides (CLI flags, presets).
    pub fn with_overrides(mut self, config: &AnalyzerConfig) -> Self {
        let summary = ConfigSummary::from_config(config);
        if summary != self.summary {
            self.config_hash = canonical_hash(config);
            self.summary = summary;
        }
        self
    }

    /// Get a short identifier for this snapshot (first 12 chars of hash).
    pub fn short_id(&self) -> &str {
        &self.config_hash[..12.min(self.config_hash.len())]
    }
}

fn canonical_hash(config: &AnalyzerConfig) -> String {
    let json = serde_json::to_string(config).unwrap_or_default();
    hash_content(&json)
}

/// Hash content with SHA-256 and return hex string.
fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
