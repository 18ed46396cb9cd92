//! Typed configuration for the underperforming-group analyzer.
//!
//! Every field has a default so a partial JSON document (or `{}`) is valid;
//! missing fields take the built-in values.

use ga_math::DistanceMetric;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::validate::ValidationError;

/// Default flagging threshold on the per-cluster quality ratio.
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Default minimum number of points for a cluster to exist.
pub const DEFAULT_MIN_CLUSTER_SIZE: usize = 5;

/// Default tolerance on `|sum(p) - 1|` for predicted probability rows.
pub const DEFAULT_PROBABILITY_TOLERANCE: f64 = 1e-3;

/// Analyzer configuration (`underperf_group.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Config format version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Clusters whose quality ratio falls strictly below this are flagged.
    /// Must lie in (0, 1).
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Distance metric used for clustering.
    #[serde(default)]
    pub metric: DistanceMetric,

    /// HDBSCAN parameters.
    #[serde(default)]
    pub clustering: ClusteringParams,

    /// Allowed deviation of each pred_probs row sum from 1.
    #[serde(default = "default_probability_tolerance")]
    pub probability_tolerance: f64,

    /// Text report settings.
    #[serde(default)]
    pub report: ReportSettings,
}

fn default_schema_version() -> String {
    crate::CONFIG_SCHEMA_VERSION.to_string()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_probability_tolerance() -> f64 {
    DEFAULT_PROBABILITY_TOLERANCE
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            schema_version: default_schema_version(),
            threshold: DEFAULT_THRESHOLD,
            metric: DistanceMetric::default(),
            clustering: ClusteringParams::default(),
            probability_tolerance: DEFAULT_PROBABILITY_TOLERANCE,
            report: ReportSettings::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ValidationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse config from a JSON string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json)
            .map_err(|e| ValidationError::ParseError(format!("Invalid JSON: {}", e)))
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// How flat clusters are extracted from the condensed tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ClusterSelectionMethod {
    /// Excess of mass: keep a parent when its stability beats its children's.
    #[default]
    Eom,
    /// Always take the leaves of the condensed tree.
    Leaf,
}

impl ClusterSelectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterSelectionMethod::Eom => "eom",
            ClusterSelectionMethod::Leaf => "leaf",
        }
    }
}

impl fmt::Display for ClusterSelectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ClusterSelectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eom" | "excess_of_mass" => Ok(ClusterSelectionMethod::Eom),
            "leaf" => Ok(ClusterSelectionMethod::Leaf),
            _ => Err(format!("unknown cluster selection method: {}", s)),
        }
    }
}

/// HDBSCAN parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ClusteringParams {
    /// Smallest group of points that counts as a cluster. At least 2.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    /// Neighbourhood size for core distances; defaults to `min_cluster_size`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_samples: Option<usize>,

    #[serde(default)]
    pub cluster_selection_method: ClusterSelectionMethod,

    /// Permit the whole dataset to come back as one cluster.
    #[serde(default)]
    pub allow_single_cluster: bool,
}

fn default_min_cluster_size() -> usize {
    DEFAULT_MIN_CLUSTER_SIZE
}

impl Default for ClusteringParams {
    fn default() -> Self {
        ClusteringParams {
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            min_samples: None,
            cluster_selection_method: ClusterSelectionMethod::default(),
            allow_single_cluster: false,
        }
    }
}

impl ClusteringParams {
    /// `min_samples`, falling back to `min_cluster_size`.
    pub fn effective_min_samples(&self) -> usize {
        self.min_samples.unwrap_or(self.min_cluster_size)
    }
}

/// Settings for the text report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ReportSettings {
    /// 0 prints only the headline; higher levels add info sections.
    #[serde(default)]
    pub verbosity: u8,

    /// How many of the most severe examples to list.
    #[serde(default = "default_max_examples")]
    pub max_examples: usize,
}

fn default_max_examples() -> usize {
    5
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            verbosity: 0,
            max_examples: default_max_examples(),
        }
    }
}
