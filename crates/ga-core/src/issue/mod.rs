//! Pluggable issue managers.
//!
//! Every analyzer implements [`IssueManager`]: it borrows a
//! [`DatasetContext`], takes named per-example arrays in
//! [`IssueManager::find_issues`], and exposes three results once that
//! succeeds: a per-example [`IssueTable`], a one-row [`IssueSummary`] and a
//! free-form [`Info`] bundle. [`IssueRegistry`] maps issue names to
//! constructors so callers can pick analyzers by name.

pub mod report;
pub mod underperf_group;

pub use underperf_group::UnderperfGroupIssueManager;

use std::collections::BTreeMap;

use ga_common::{Error, Result};
use ga_config::AnalyzerConfig;
use ga_math::Matrix;
use schemars::JsonSchema;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::context::DatasetContext;

/// Algorithm-specific diagnostics, keyed by name.
pub type Info = Map<String, Value>;

/// Named per-example arrays handed to [`IssueManager::find_issues`].
///
/// Labels are not here: they come from the [`DatasetContext`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IssueInputs<'a> {
    pub features: Option<&'a Matrix>,
    pub pred_probs: Option<&'a Matrix>,
    /// Precomputed cluster ids, `-1` for noise.
    pub cluster_ids: Option<&'a [i64]>,
}

/// Per-example issue flags and scores, input order.
///
/// Serializes column-wise as `{"is_<name>_issue": [...], "<name>_score": [...]}`.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueTable {
    issue_name: String,
    flags: Vec<bool>,
    scores: Vec<f64>,
}

impl IssueTable {
    pub fn new(issue_name: impl Into<String>, flags: Vec<bool>, scores: Vec<f64>) -> Result<Self> {
        if flags.len() != scores.len() {
            return Err(Error::ShapeMismatch {
                what: "issue scores".to_string(),
                expected: flags.len(),
                actual: scores.len(),
            });
        }
        Ok(IssueTable {
            issue_name: issue_name.into(),
            flags,
            scores,
        })
    }

    pub fn issue_name(&self) -> &str {
        &self.issue_name
    }

    pub fn flag_column(&self) -> String {
        format!("is_{}_issue", self.issue_name)
    }

    pub fn score_column(&self) -> String {
        format!("{}_score", self.issue_name)
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn num_issues(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }

    /// Up to `limit` row indices with the lowest scores; ties keep input order.
    pub fn most_severe(&self, limit: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.scores[a].total_cmp(&self.scores[b]));
        order.truncate(limit);
        order
    }
}

impl Serialize for IssueTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.flag_column(), &self.flags)?;
        map.serialize_entry(&self.score_column(), &self.scores)?;
        map.end()
    }
}

/// One-row summary of an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IssueSummary {
    pub issue_type: String,
    /// Overall dataset quality for this issue, in [0, 1]; lower is worse.
    pub score: f64,
    pub num_issues: usize,
}

/// Contract every analyzer implements.
pub trait IssueManager {
    /// Short machine name, e.g. `"underperf_group"`.
    fn issue_name(&self) -> &'static str;

    /// Paragraph shown under "About this issue" in reports.
    fn description(&self) -> &'static str;

    /// Info keys shown at each report verbosity level, cumulative.
    fn verbosity_levels(&self) -> &'static [(u8, &'static [&'static str])] {
        &[]
    }

    /// Run the analysis. On error the previous results are left untouched.
    fn find_issues(&mut self, inputs: &IssueInputs<'_>) -> Result<()>;

    fn issues(&self) -> Option<&IssueTable>;

    fn summary(&self) -> Option<&IssueSummary>;

    fn info(&self) -> Option<&Info>;

    /// Render a text report from results, which need not be this manager's own.
    fn report(
        &self,
        issues: &IssueTable,
        summary: &IssueSummary,
        info: &Info,
        verbosity: u8,
    ) -> String {
        report::render(&report::ReportInput {
            issue_name: self.issue_name(),
            description: Some(self.description()),
            verbosity_levels: self.verbosity_levels(),
            issues,
            summary,
            info,
            verbosity,
            max_examples: report::DEFAULT_MAX_EXAMPLES,
        })
    }
}

/// Builds a manager bound to a dataset context.
pub type ManagerFactory =
    for<'a> fn(&'a DatasetContext, &AnalyzerConfig) -> Box<dyn IssueManager + 'a>;

/// Issue names mapped to manager constructors.
#[derive(Clone)]
pub struct IssueRegistry {
    factories: BTreeMap<String, ManagerFactory>,
}

impl Default for IssueRegistry {
    fn default() -> Self {
        let mut registry = IssueRegistry::empty();
        registry.register(underperf_group::ISSUE_NAME, underperf_group::factory);
        registry
    }
}

impl IssueRegistry {
    pub fn empty() -> Self {
        IssueRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// Add or replace the constructor for `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: ManagerFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    pub fn create<'a>(
        &self,
        name: &str,
        context: &'a DatasetContext,
        config: &AnalyzerConfig,
    ) -> Result<Box<dyn IssueManager + 'a>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::UnknownIssueType {
                name: name.to_string(),
            })?;
        Ok(factory(context, config))
    }
}

impl std::fmt::Debug for IssueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssueRegistry")
            .field("names", &self.names())
            .finish()
    }
}
