//! JSON Schema generation for input and output types.
//!
//! These schemas let agents validate datasets and config files before
//! running an audit, and validate the audit envelope they get back.
//!
//! # Usage
//!
//! ```bash
//! # List available schema types
//! ga-core schema --list
//!
//! # Generate schema for a specific type
//! ga-core schema AuditReport
//!
//! # Generate all schemas
//! ga-core schema --all
//! ```

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::dataset::DatasetFile;
pub use crate::issue::IssueSummary;
pub use crate::run::AuditReport;
pub use crate::scoring::ClusterScore;
pub use ga_config::{AnalyzerConfig, ClusteringParams, ConfigSnapshot, ReportSettings};

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        // Inputs
        ("DatasetFile", "Row-aligned features, pred_probs and labels"),
        ("AnalyzerConfig", "Analyzer configuration file"),
        ("ClusteringParams", "HDBSCAN parameters"),
        ("ReportSettings", "Text report settings"),
        // Outputs
        ("AuditReport", "Complete audit envelope"),
        ("IssueSummary", "One-row analysis summary"),
        ("ClusterScore", "Per-cluster size, mean quality and score"),
        ("ConfigSnapshot", "Effective configuration of a run"),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns the schema as a serde_json::Value, or None if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "DatasetFile" => schema_for!(DatasetFile),
        "AnalyzerConfig" => schema_for!(AnalyzerConfig),
        "ClusteringParams" => schema_for!(ClusteringParams),
        "ReportSettings" => schema_for!(ReportSettings),
        "AuditReport" => schema_for!(AuditReport),
        "IssueSummary" => schema_for!(IssueSummary),
        "ClusterScore" => schema_for!(ClusterScore),
        "ConfigSnapshot" => schema_for!(ConfigSnapshot),
        _ => return None,
    };

    serde_json::to_value(schema).ok()
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    let mut schemas = BTreeMap::new();
    for (name, _desc) in available_schemas() {
        if let Some(schema) = generate_schema(name) {
            schemas.insert(name.to_string(), schema);
        }
    }
    schemas
}

/// Schema output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

/// Format a schema value for output.
pub fn format_schema(schema: &Value, format: SchemaFormat) -> String {
    let rendered = match format {
        SchemaFormat::Json => serde_json::to_string_pretty(schema),
        SchemaFormat::JsonCompact => serde_json::to_string(schema),
    };
    rendered.unwrap_or_default()
}
