//! Underperforming-group analyzer.
//!
//! Clusters the feature space, then compares each cluster's mean
//! self-confidence with the dataset-wide mean. Every example inherits its
//! cluster's ratio as its score and is flagged when that ratio falls below
//! the configured threshold.

use ga_common::{Error, Result};
use ga_config::AnalyzerConfig;
use ga_math::Matrix;
use serde_json::{json, Value};

use super::report::{self, ReportInput};
use super::{Info, IssueInputs, IssueManager, IssueSummary, IssueTable};
use crate::cluster::{Clusterer, Hdbscan, PrecomputedClusters};
use crate::context::DatasetContext;
use crate::logging::event_names;
use crate::quality::{self_confidence, validate_pred_probs};
use crate::scoring::{score_groups, GroupScores};

pub const ISSUE_NAME: &str = "underperf_group";

const DESCRIPTION: &str = "An underperforming group is a cluster of examples in feature space \
on which the model predicts the given labels markedly worse than on the rest of the dataset. \
Each example is scored by the ratio of its cluster's mean self-confidence to the mean over \
all examples; low ratios point at hard subpopulations, mislabeled regions or systematic \
data problems.";

const VERBOSITY_LEVELS: &[(u8, &[&str])] = &[
    (0, &[]),
    (1, &["threshold", "n_noise", "worst_cluster_id", "worst_cluster_ratio"]),
    (
        2,
        &[
            "metric",
            "clustering_performed",
            "HDBSCAN",
            "precomputed",
            "global_quality",
            "cluster_scores",
        ],
    ),
];

#[derive(Debug, Clone)]
struct Findings {
    issues: IssueTable,
    summary: IssueSummary,
    info: Info,
}

/// Finds clusters whose predictions are much worse than average.
#[derive(Debug, Clone)]
pub struct UnderperfGroupIssueManager<'a> {
    context: &'a DatasetContext,
    config: AnalyzerConfig,
    findings: Option<Findings>,
}

pub(crate) fn factory<'a>(
    context: &'a DatasetContext,
    config: &AnalyzerConfig,
) -> Box<dyn IssueManager + 'a> {
    Box::new(UnderperfGroupIssueManager::new(context, config.clone()))
}

impl<'a> UnderperfGroupIssueManager<'a> {
    pub fn new(context: &'a DatasetContext, config: AnalyzerConfig) -> Self {
        UnderperfGroupIssueManager {
            context,
            config,
            findings: None,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn context(&self) -> &DatasetContext {
        self.context
    }

    /// Shape and value checks, all before any clustering.
    fn validate<'i>(&self, inputs: &IssueInputs<'i>) -> Result<(&'i Matrix, Box<dyn Clusterer>)> {
        let n = self.context.num_examples();

        let pred_probs = inputs.pred_probs.ok_or_else(|| Error::MissingInput {
            name: "pred_probs".to_string(),
        })?;
        if pred_probs.rows() != n {
            return Err(Error::ShapeMismatch {
                what: "pred_probs rows".to_string(),
                expected: n,
                actual: pred_probs.rows(),
            });
        }

        if let Some(features) = inputs.features {
            if features.rows() != n {
                return Err(Error::ShapeMismatch {
                    what: "features rows".to_string(),
                    expected: n,
                    actual: features.rows(),
                });
            }
        }

        let clusterer: Box<dyn Clusterer> = match inputs.cluster_ids {
            Some(ids) => {
                if ids.len() != n {
                    return Err(Error::ShapeMismatch {
                        what: "cluster_ids length".to_string(),
                        expected: n,
                        actual: ids.len(),
                    });
                }
                Box::new(PrecomputedClusters::new(ids)?)
            }
            None => {
                let features = inputs.features.ok_or_else(|| Error::MissingInput {
                    name: "features".to_string(),
                })?;
                if features.cols() == 0 {
                    return Err(Error::ShapeMismatch {
                        what: "features columns".to_string(),
                        expected: 1,
                        actual: 0,
                    });
                }
                for (row, values) in features.iter_rows().enumerate() {
                    if let Some(col) = values.iter().position(|v| !v.is_finite()) {
                        return Err(Error::NonFiniteFeature { row, col });
                    }
                }
                Box::new(Hdbscan::from_params(
                    self.config.metric,
                    &self.config.clustering,
                ))
            }
        };

        validate_pred_probs(
            pred_probs,
            self.context.num_classes(),
            self.config.probability_tolerance,
        )?;

        Ok((pred_probs, clusterer))
    }

    fn analyze(&self, inputs: &IssueInputs<'_>) -> Result<Findings> {
        let (pred_probs, clusterer) = self.validate(inputs)?;
        tracing::debug!(
            target: event_names::VALIDATE_FINISHED,
            n_examples = self.context.num_examples(),
            num_classes = self.context.num_classes(),
            "inputs validated"
        );

        tracing::debug!(
            target: event_names::CLUSTER_STARTED,
            algorithm = clusterer.name(),
            "clustering"
        );
        let assignment = clusterer.cluster(inputs.features)?;
        if !clusterer.performs_clustering() {
            tracing::debug!(
                target: event_names::CLUSTER_PRECOMPUTED,
                "using caller-supplied cluster ids"
            );
        }
        tracing::info!(
            target: event_names::CLUSTER_FINISHED,
            algorithm = clusterer.name(),
            n_clusters = assignment.n_clusters(),
            n_noise = assignment.n_noise(),
            "clustering finished"
        );

        let quality = self_confidence(pred_probs, self.context.labels())?;
        let scores = score_groups(&quality, &assignment, self.config.threshold);
        tracing::info!(
            target: event_names::SCORE_FINISHED,
            global_quality = scores.global_quality,
            summary_score = scores.summary_score,
            num_issues = scores.num_issues(),
            "scoring finished"
        );

        let info = self.build_info(clusterer.as_ref(), assignment.n_clusters(), &scores);
        let summary = IssueSummary {
            issue_type: ISSUE_NAME.to_string(),
            score: scores.summary_score,
            num_issues: scores.num_issues(),
        };
        let issues = IssueTable::new(ISSUE_NAME, scores.flags, scores.scores)?;
        Ok(Findings {
            issues,
            summary,
            info,
        })
    }

    fn build_info(&self, clusterer: &dyn Clusterer, n_clusters: usize, scores: &GroupScores) -> Info {
        let mut algorithm = clusterer.params();
        algorithm.insert("n_clusters".into(), json!(n_clusters));

        let mut info = Info::new();
        info.insert(
            "metric".into(),
            json!(clusterer.metric().unwrap_or(self.config.metric).as_str()),
        );
        info.insert(clusterer.name().into(), Value::Object(algorithm));
        info.insert(
            "clustering_performed".into(),
            json!(clusterer.performs_clustering()),
        );
        info.insert("threshold".into(), json!(self.config.threshold));
        info.insert("global_quality".into(), json!(scores.global_quality));
        info.insert("cluster_scores".into(), json!(scores.clusters));
        info.insert(
            "worst_cluster_id".into(),
            json!(scores.worst_cluster.map(|(id, _)| id)),
        );
        info.insert("worst_cluster_ratio".into(), json!(scores.summary_score));
        info.insert("n_noise".into(), json!(scores.n_noise));
        info
    }
}

impl IssueManager for UnderperfGroupIssueManager<'_> {
    fn issue_name(&self) -> &'static str {
        ISSUE_NAME
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn verbosity_levels(&self) -> &'static [(u8, &'static [&'static str])] {
        VERBOSITY_LEVELS
    }

    fn find_issues(&mut self, inputs: &IssueInputs<'_>) -> Result<()> {
        match self.analyze(inputs) {
            Ok(findings) => {
                self.findings = Some(findings);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(
                    target: event_names::VALIDATE_FAILED,
                    code = err.code(),
                    error = %err,
                    "analysis aborted"
                );
                Err(err)
            }
        }
    }

    fn issues(&self) -> Option<&IssueTable> {
        self.findings.as_ref().map(|f| &f.issues)
    }

    fn summary(&self) -> Option<&IssueSummary> {
        self.findings.as_ref().map(|f| &f.summary)
    }

    fn info(&self) -> Option<&Info> {
        self.findings.as_ref().map(|f| &f.info)
    }

    fn report(
        &self,
        issues: &IssueTable,
        summary: &IssueSummary,
        info: &Info,
        verbosity: u8,
    ) -> String {
        report::render(&ReportInput {
            issue_name: ISSUE_NAME,
            description: Some(DESCRIPTION),
            verbosity_levels: VERBOSITY_LEVELS,
            issues,
            summary,
            info,
            verbosity,
            max_examples: self.config.report.max_examples,
        })
    }
}
