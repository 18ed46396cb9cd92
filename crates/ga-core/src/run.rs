//! One audit run: dataset in, report envelope out.

use chrono::Utc;
use ga_common::{Result, RunId, SCHEMA_VERSION};
use ga_config::{AnalyzerConfig, ConfigSnapshot};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dataset::LoadedDataset;
use crate::exit_codes::ExitCode;
use crate::issue::{Info, IssueRegistry, IssueSummary};
use crate::logging::event_names;

/// Machine-readable result of `ga-core audit`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AuditReport {
    pub schema_version: String,
    /// RFC 3339 UTC timestamp.
    pub generated_at: String,
    pub run_id: String,
    /// Input path, or `-` for stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<String>,
    pub num_examples: usize,
    pub config: ConfigSnapshot,
    pub summary: IssueSummary,
    pub info: Info,
    /// Per-example columns, only with `--include-issues`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues: Option<Value>,
    pub exit_code: i32,
    pub exit_code_name: String,
}

/// What to run and how to render it.
#[derive(Debug, Clone)]
pub struct AuditOptions<'a> {
    pub issue_type: &'a str,
    pub run_id: &'a RunId,
    pub dataset_id: Option<&'a str>,
    pub include_issues: bool,
    pub verbosity: u8,
}

/// Envelope plus rendered text report.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    pub report: AuditReport,
    pub text: String,
    pub exit_code: ExitCode,
}

pub fn run_audit(
    registry: &IssueRegistry,
    dataset: &LoadedDataset,
    config: &AnalyzerConfig,
    snapshot: ConfigSnapshot,
    options: &AuditOptions<'_>,
) -> Result<AuditOutcome> {
    let mut manager = registry.create(options.issue_type, &dataset.context, config)?;
    manager.find_issues(&dataset.inputs())?;

    let (Some(issues), Some(summary), Some(info)) =
        (manager.issues(), manager.summary(), manager.info())
    else {
        return Err(ga_common::Error::Analysis(format!(
            "{} produced no results",
            options.issue_type
        )));
    };

    let text = manager.report(issues, summary, info, options.verbosity);
    tracing::debug!(
        target: event_names::REPORT_RENDERED,
        bytes = text.len(),
        verbosity = options.verbosity,
        "report rendered"
    );

    let exit_code = ExitCode::from_issue_count(summary.num_issues);
    let report = AuditReport {
        schema_version: SCHEMA_VERSION.to_string(),
        generated_at: Utc::now().to_rfc3339(),
        run_id: options.run_id.to_string(),
        dataset: options.dataset_id.map(str::to_string),
        num_examples: dataset.context.num_examples(),
        config: snapshot,
        summary: summary.clone(),
        info: info.clone(),
        issues: if options.include_issues {
            Some(serde_json::to_value(issues)?)
        } else {
            None
        },
        exit_code: exit_code.as_i32(),
        exit_code_name: exit_code.code_name().to_string(),
    };

    Ok(AuditOutcome {
        report,
        text,
        exit_code,
    })
}

/// One-line summary for `--format summary`.
pub fn summary_line(report: &AuditReport) -> String {
    format!(
        "{}: {} of {} examples flagged, score {:.4} [{}]",
        report.summary.issue_type,
        report.summary.num_issues,
        report.num_examples,
        report.summary.score,
        report.exit_code_name
    )
}

/// Markdown rendering for `--format md`.
pub fn render_markdown(outcome: &AuditOutcome) -> String {
    let r = &outcome.report;
    let mut out = String::new();
    out.push_str(&format!("# {} audit\n\n", r.summary.issue_type));
    out.push_str(&format!("- Run: `{}`\n", r.run_id));
    if let Some(dataset) = &r.dataset {
        out.push_str(&format!("- Dataset: `{}`\n", dataset));
    }
    out.push_str(&format!("- Examples: {}\n", r.num_examples));
    out.push_str(&format!("- Flagged: {}\n", r.summary.num_issues));
    out.push_str(&format!("- Score: {:.4}\n", r.summary.score));
    out.push_str(&format!(
        "- Config: {} (`{}`)\n\n",
        r.config.config_source,
        r.config.short_id()
    ));
    out.push_str("```text\n");
    out.push_str(&outcome.text);
    out.push_str("```\n");
    out
}
