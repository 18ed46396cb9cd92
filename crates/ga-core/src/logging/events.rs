//! Structured event definitions for logging.
//!
//! Events are plain `tracing` events whose target is one of the
//! [`event_names`]; the JSONL layer adds the correlation IDs and stage.

use serde::{Deserialize, Serialize};

/// Processing stages in the audit pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup, configuration and input loading.
    Init,
    /// Input shape and value checks.
    Validate,
    /// Density-based clustering of the features.
    Cluster,
    /// Per-example quality and per-cluster ratios.
    Score,
    /// Report and payload rendering.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Validate => "validate",
            Stage::Cluster => "cluster",
            Stage::Score => "score",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config/init events
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";
    pub const INPUT_LOADED: &str = "input.loaded";

    // Validate stage
    pub const VALIDATE_FINISHED: &str = "validate.finished";
    pub const VALIDATE_FAILED: &str = "validate.failed";

    // Cluster stage
    pub const CLUSTER_STARTED: &str = "cluster.started";
    pub const CLUSTER_DEGENERATE: &str = "cluster.degenerate";
    pub const CLUSTER_PRECOMPUTED: &str = "cluster.precomputed";
    pub const CLUSTER_FINISHED: &str = "cluster.finished";

    // Score stage
    pub const SCORE_ZERO_GLOBAL: &str = "score.zero_global";
    pub const SCORE_FINISHED: &str = "score.finished";

    // Report stage
    pub const REPORT_RENDERED: &str = "report.rendered";

    // Error events
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation IDs shared by every event of one invocation.
#[derive(Debug, Clone)]
pub struct LogContext {
    /// Unique ID for this invocation.
    pub run_id: String,
    /// Dataset being audited, once known.
    pub dataset_id: Option<String>,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
            dataset_id: None,
        }
    }

    pub fn with_dataset_id(mut self, dataset_id: impl Into<String>) -> Self {
        self.dataset_id = Some(dataset_id.into());
        self
    }
}
