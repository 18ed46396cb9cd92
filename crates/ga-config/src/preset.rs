//! Configuration presets for common audit scenarios.
//!
//! Provides pre-built configurations for:
//! - Default: the built-in values
//! - Sensitive: flags milder degradation
//! - Conservative: only large, clearly failing groups
//! - Fine: small clusters from the leaves of the hierarchy

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::analyzer::{AnalyzerConfig, ClusterSelectionMethod, ClusteringParams, ReportSettings};

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Built-in defaults
    Default,
    /// Higher threshold, catches milder degradation
    Sensitive,
    /// Lower threshold and larger clusters, fewer false alarms
    Conservative,
    /// Small leaf clusters for narrow subpopulations
    Fine,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Default,
        PresetName::Sensitive,
        PresetName::Conservative,
        PresetName::Fine,
    ];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Sensitive => "sensitive",
            PresetName::Conservative => "conservative",
            PresetName::Fine => "fine",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" | "defaults" => Some(PresetName::Default),
            "sensitive" | "strict" => Some(PresetName::Sensitive),
            "conservative" | "lenient" => Some(PresetName::Conservative),
            "fine" | "fine-grained" | "leaf" => Some(PresetName::Fine),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Default => "Built-in values: threshold 0.1, min_cluster_size 5, eom selection",
            PresetName::Sensitive => {
                "Threshold 0.3: flags groups performing under a third of the global quality"
            }
            PresetName::Conservative => {
                "Threshold 0.05 and min_cluster_size 10: only large, clearly failing groups"
            }
            PresetName::Fine => {
                "Leaf selection with min_cluster_size 3: surfaces narrow subpopulations"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    #[error("unknown preset '{0}'; expected one of {expected}", expected = available())]
    UnknownPreset(String),
}

fn available() -> String {
    PresetName::ALL
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<PresetError> for ga_common::Error {
    fn from(err: PresetError) -> Self {
        ga_common::Error::InvalidConfig {
            field: "preset".to_string(),
            message: err.to_string(),
        }
    }
}

/// Get the config for a preset.
pub fn get_preset(name: PresetName) -> AnalyzerConfig {
    match name {
        PresetName::Default => AnalyzerConfig::default(),
        PresetName::Sensitive => AnalyzerConfig {
            threshold: 0.3,
            ..AnalyzerConfig::default()
        },
        PresetName::Conservative => AnalyzerConfig {
            threshold: 0.05,
            clustering: ClusteringParams {
                min_cluster_size: 10,
                min_samples: Some(10),
                ..ClusteringParams::default()
            },
            ..AnalyzerConfig::default()
        },
        PresetName::Fine => AnalyzerConfig {
            clustering: ClusteringParams {
                min_cluster_size: 3,
                min_samples: Some(2),
                cluster_selection_method: ClusterSelectionMethod::Leaf,
                allow_single_cluster: false,
            },
            report: ReportSettings {
                verbosity: 1,
                ..ReportSettings::default()
            },
            ..AnalyzerConfig::default()
        },
    }
}

/// Preset listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
}

impl PresetInfo {
    fn from_preset(name: PresetName) -> Self {
        PresetInfo {
            name: name.as_str().to_string(),
            description: name.description().to_string(),
        }
    }
}

/// List all presets with their descriptions.
pub fn list_presets() -> Vec<PresetInfo> {
    PresetName::ALL
        .iter()
        .map(|&name| PresetInfo::from_preset(name))
        .collect()
}
