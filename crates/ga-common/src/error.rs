//! Error types for group auditing.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for automation
//! - Remediation suggestions for humans
//! - Suggested actions for agents
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Input Shape Mismatch
//!   Reason: shape mismatch in features rows: expected 200, got 199
//!   Fix: Align features, pred_probs and labels row-by-row before auditing.
//! ```
//!
//! # Agent-Facing Output
//!
//! ```json
//! {
//!   "code": 21,
//!   "category": "input",
//!   "message": "shape mismatch in features rows: expected 200, got 199",
//!   "recoverable": true,
//!   "suggested_action": "fix_input",
//!   "context": { "what": "features rows", "expected": 200, "actual": 199 }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for group audit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file or parameter errors.
    Config,
    /// Malformed or inconsistent input arrays.
    Input,
    /// Failures inside clustering or scoring.
    Analysis,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Analysis => write!(f, "analysis"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Suggested actions for agents to take in response to errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    /// Correct the input arrays and rerun.
    FixInput,
    /// Reset configuration to defaults.
    ResetConfig,
    /// Run the config validation command.
    RunCheck,
    /// Retry the operation (transient I/O only).
    Retry,
    /// Manual intervention required.
    ManualIntervention,
    /// No action needed (informational).
    None,
}

impl std::fmt::Display for SuggestedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestedAction::FixInput => write!(f, "fix_input"),
            SuggestedAction::ResetConfig => write!(f, "reset_config"),
            SuggestedAction::RunCheck => write!(f, "run_check"),
            SuggestedAction::Retry => write!(f, "retry"),
            SuggestedAction::ManualIntervention => write!(f, "manual_intervention"),
            SuggestedAction::None => write!(f, "none"),
        }
    }
}

/// Unified error type for group auditing.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid value for {field}: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("schema version mismatch: expected {expected}, got {actual}")]
    SchemaVersion { expected: String, actual: String },

    // Input errors (20-29)
    #[error("missing required input: {name}")]
    MissingInput { name: String },

    #[error("shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("pred_probs row {row} is not a probability distribution: {reason}")]
    InvalidDistribution { row: usize, reason: String },

    #[error("label {label} at row {row} is outside [0, {num_classes})")]
    InvalidLabel {
        row: usize,
        label: usize,
        num_classes: usize,
    },

    #[error("features row {row}, column {col} is not finite")]
    NonFiniteFeature { row: usize, col: usize },

    #[error("dataset has no examples")]
    EmptyDataset,

    #[error("cluster id {id} at row {row} is invalid; ids are non-negative and -1 marks noise")]
    InvalidClusterId { row: usize, id: i64 },

    // Analysis errors (30-39)

    #[error("analysis failed: {0}")]
    Analysis(String),

    #[error("unknown issue type: {name}")]
    UnknownIssueType { name: String },

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Configuration errors
    /// - 20-29: Input errors
    /// - 30-39: Analysis errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidConfig { .. } => 11,
            Error::SchemaVersion { .. } => 12,
            Error::MissingInput { .. } => 20,
            Error::ShapeMismatch { .. } => 21,
            Error::InvalidDistribution { .. } => 22,
            Error::InvalidLabel { .. } => 23,
            Error::NonFiniteFeature { .. } => 24,
            Error::EmptyDataset => 25,
            Error::InvalidClusterId { .. } => 26,
            Error::Analysis(_) => 31,
            Error::UnknownIssueType { .. } => 32,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::InvalidConfig { .. } | Error::SchemaVersion { .. } => {
                ErrorCategory::Config
            }

            Error::MissingInput { .. }
            | Error::ShapeMismatch { .. }
            | Error::InvalidDistribution { .. }
            | Error::InvalidLabel { .. }
            | Error::NonFiniteFeature { .. }
            | Error::EmptyDataset
            | Error::InvalidClusterId { .. } => ErrorCategory::Input,

            Error::Analysis(_) | Error::UnknownIssueType { .. } => ErrorCategory::Analysis,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error is potentially recoverable.
    ///
    /// Analysis is deterministic, so rerunning with the same inputs never
    /// helps; recovery always means changing inputs, config, or environment.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Config(_) | Error::InvalidConfig { .. } | Error::SchemaVersion { .. } => true,

            Error::MissingInput { .. }
            | Error::ShapeMismatch { .. }
            | Error::InvalidDistribution { .. }
            | Error::InvalidLabel { .. }
            | Error::NonFiniteFeature { .. }
            | Error::EmptyDataset
            | Error::InvalidClusterId { .. } => true,

            Error::Analysis(_) => false,
            Error::UnknownIssueType { .. } => true,

            Error::Io(_) => true,
            Error::Json(_) => true,
        }
    }

    /// Returns the suggested action for agents.
    pub fn suggested_action(&self) -> SuggestedAction {
        match self {
            Error::Config(_) => SuggestedAction::RunCheck,
            Error::InvalidConfig { .. } => SuggestedAction::RunCheck,
            Error::SchemaVersion { .. } => SuggestedAction::ResetConfig,

            Error::MissingInput { .. }
            | Error::ShapeMismatch { .. }
            | Error::InvalidDistribution { .. }
            | Error::InvalidLabel { .. }
            | Error::NonFiniteFeature { .. }
            | Error::EmptyDataset
            | Error::InvalidClusterId { .. } => SuggestedAction::FixInput,

            Error::Analysis(_) => SuggestedAction::ManualIntervention,
            Error::UnknownIssueType { .. } => SuggestedAction::FixInput,

            Error::Io(_) => SuggestedAction::Retry,
            Error::Json(_) => SuggestedAction::FixInput,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::Config(_) => {
                "Run 'ga-core config validate' to check the configuration file."
            }
            Error::InvalidConfig { .. } => {
                "Fix the named field; threshold must lie in (0, 1) and min_cluster_size must be at least 2."
            }
            Error::SchemaVersion { .. } => {
                "Regenerate the config with 'ga-core config show --defaults' and reapply your changes."
            }

            Error::MissingInput { .. } => {
                "Pass pred_probs, plus either features or precomputed cluster_ids."
            }
            Error::ShapeMismatch { .. } => {
                "Align features, pred_probs and labels row-by-row before auditing."
            }
            Error::InvalidDistribution { .. } => {
                "Each pred_probs row must be non-negative and sum to 1; apply softmax to raw model outputs."
            }
            Error::InvalidLabel { .. } => {
                "Labels must be integer class indices below the number of pred_probs columns."
            }
            Error::NonFiniteFeature { .. } => {
                "Impute or drop rows containing NaN or infinite feature values."
            }
            Error::EmptyDataset => "Provide at least one example.",
            Error::InvalidClusterId { .. } => {
                "Precomputed cluster_ids must be non-negative integers, or -1 for noise."
            }

            Error::Analysis(_) => {
                "Internal analysis failure. Report it together with the input dataset."
            }
            Error::UnknownIssueType { .. } => {
                "Use one of the registered issue types, e.g. 'underperf_group'."
            }

            Error::Io(_) => {
                "Check that the input file exists and is readable, then retry."
            }
            Error::Json(_) => {
                "Invalid JSON input. Check syntax with 'jq . <file>'."
            }
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::Config(_) => "Configuration Error",
            Error::InvalidConfig { .. } => "Invalid Configuration Value",
            Error::SchemaVersion { .. } => "Config Schema Mismatch",

            Error::MissingInput { .. } => "Missing Input",
            Error::ShapeMismatch { .. } => "Input Shape Mismatch",
            Error::InvalidDistribution { .. } => "Invalid Probability Distribution",
            Error::InvalidLabel { .. } => "Invalid Label",
            Error::NonFiniteFeature { .. } => "Non-finite Feature",
            Error::EmptyDataset => "Empty Dataset",
            Error::InvalidClusterId { .. } => "Invalid Cluster Id",

            Error::Analysis(_) => "Analysis Error",
            Error::UnknownIssueType { .. } => "Unknown Issue Type",

            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Suggested action for agents.
    pub suggested_action: SuggestedAction,

    /// Additional structured context (e.g., row index, field name).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::InvalidConfig { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::MissingInput { name } => {
                context.insert("input".to_string(), serde_json::json!(name));
            }
            Error::ShapeMismatch {
                what,
                expected,
                actual,
            } => {
                context.insert("what".to_string(), serde_json::json!(what));
                context.insert("expected".to_string(), serde_json::json!(expected));
                context.insert("actual".to_string(), serde_json::json!(actual));
            }
            Error::InvalidDistribution { row, .. } | Error::InvalidLabel { row, .. } => {
                context.insert("row".to_string(), serde_json::json!(row));
            }
            Error::NonFiniteFeature { row, col } => {
                context.insert("row".to_string(), serde_json::json!(row));
                context.insert("col".to_string(), serde_json::json!(col));
            }
            Error::InvalidClusterId { row, id } => {
                context.insert("row".to_string(), serde_json::json!(row));
                context.insert("cluster_id".to_string(), serde_json::json!(id));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
            context,
        }
    }
}

impl StructuredError {
    /// Add additional context to the error.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }

    /// Serialize to pretty JSON string.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| self.to_json())
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape_err() -> Error {
        Error::ShapeMismatch {
            what: "features rows".into(),
            expected: 200,
            actual: 199,
        }
    }

    #[test]
    fn test_error_code() {
        assert_eq!(Error::Config("test".into()).code(), 10);
        assert_eq!(shape_err().code(), 21);
        assert_eq!(
            Error::InvalidDistribution {
                row: 3,
                reason: "x".into()
            }
            .code(),
            22
        );
        assert_eq!(Error::InvalidClusterId { row: 1, id: -2 }.code(), 26);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(Error::Config("test".into()).category(), ErrorCategory::Config);
        assert_eq!(shape_err().category(), ErrorCategory::Input);
        assert_eq!(Error::EmptyDataset.category(), ErrorCategory::Input);
        assert_eq!(
            Error::InvalidClusterId { row: 1, id: -2 }.category(),
            ErrorCategory::Input
        );
        assert_eq!(Error::Analysis("x".into()).category(), ErrorCategory::Analysis);
    }

    #[test]
    fn test_error_recoverable() {
        assert!(shape_err().is_recoverable());
        assert!(!Error::Analysis("x".into()).is_recoverable());
    }

    #[test]
    fn test_suggested_action() {
        assert_eq!(shape_err().suggested_action(), SuggestedAction::FixInput);
        assert_eq!(
            Error::SchemaVersion {
                expected: "1.0.0".into(),
                actual: "0.9".into()
            }
            .suggested_action(),
            SuggestedAction::ResetConfig
        );
    }

    #[test]
    fn test_structured_error_from_error() {
        let structured = StructuredError::from(&shape_err());

        assert_eq!(structured.code, 21);
        assert_eq!(structured.category, ErrorCategory::Input);
        assert!(structured.recoverable);
        assert_eq!(structured.suggested_action, SuggestedAction::FixInput);
        assert_eq!(
            structured.context.get("expected"),
            Some(&serde_json::json!(200))
        );
    }

    #[test]
    fn test_structured_error_json() {
        let err = Error::MissingInput {
            name: "pred_probs".into(),
        };
        let json = StructuredError::from(&err).with_context("analyzer", "underperf_group").to_json();

        assert!(json.contains(r#""code":20"#));
        assert!(json.contains(r#""category":"input""#));
        assert!(json.contains(r#""suggested_action":"fix_input""#));
        assert!(json.contains(r#""analyzer":"underperf_group""#));
    }

    #[test]
    fn test_format_error_human() {
        let formatted = format_error_human(&shape_err(), false);

        assert!(formatted.contains("Input Shape Mismatch"));
        assert!(formatted.contains("expected 200, got 199"));
        assert!(formatted.contains("Align features"));
    }

    #[test]
    fn test_error_category_display() {
        assert_eq!(ErrorCategory::Config.to_string(), "config");
        assert_eq!(ErrorCategory::Input.to_string(), "input");
    }

    #[test]
    fn test_suggested_action_display() {
        assert_eq!(SuggestedAction::FixInput.to_string(), "fix_input");
        assert_eq!(SuggestedAction::ResetConfig.to_string(), "reset_config");
    }
}
