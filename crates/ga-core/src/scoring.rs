//! Per-cluster performance ratios and per-example flags.
//!
//! Each cluster is scored as `min(mean quality in cluster / global mean, 1)`.
//! Examples inherit their cluster's score; noise examples score 1.0 and are
//! never flagged. A zero global mean makes every ratio 1.0.

use std::collections::BTreeMap;

use ga_math::{neumaier_sum, MeanAccumulator};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cluster::ClusterAssignment;
use crate::logging::event_names;

/// Score given to noise examples and to every cluster when the global mean is 0.
pub const NEUTRAL_SCORE: f64 = 1.0;

/// Ratios this close to 1 come from equal means summed in a different order.
const RATIO_SNAP: f64 = 4.0 * f64::EPSILON;

/// `min(mean / global, 1)`, exactly 1.0 when the two means agree up to rounding.
fn cluster_ratio(mean_quality: f64, global_quality: f64) -> f64 {
    if global_quality <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let ratio = mean_quality / global_quality;
    if (ratio - NEUTRAL_SCORE).abs() <= RATIO_SNAP {
        NEUTRAL_SCORE
    } else {
        ratio.min(NEUTRAL_SCORE)
    }
}

/// Diagnostics for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClusterScore {
    pub cluster_id: usize,
    pub size: usize,
    pub mean_quality: f64,
    pub score: f64,
}

/// Output of [`score_groups`].
#[derive(Debug, Clone, PartialEq)]
pub struct GroupScores {
    pub global_quality: f64,
    /// Per-example score, input order.
    pub scores: Vec<f64>,
    /// Per-example flag, `scores[i] < threshold`.
    pub flags: Vec<bool>,
    /// One entry per non-noise cluster, ordered by id.
    pub clusters: Vec<ClusterScore>,
    /// Minimum cluster score, 1.0 without clusters.
    pub summary_score: f64,
    /// Lowest-scoring cluster, lowest id on ties.
    pub worst_cluster: Option<(usize, f64)>,
    pub n_noise: usize,
}

impl GroupScores {
    pub fn num_issues(&self) -> usize {
        self.flags.iter().filter(|f| **f).count()
    }
}

/// Score every cluster and example.
///
/// `quality` and `assignment` must have the same length; callers validate
/// this before clustering.
pub fn score_groups(quality: &[f64], assignment: &ClusterAssignment, threshold: f64) -> GroupScores {
    debug_assert_eq!(quality.len(), assignment.len());

    let global_quality = if quality.is_empty() {
        0.0
    } else {
        neumaier_sum(quality) / quality.len() as f64
    };

    let mut per_cluster: BTreeMap<usize, MeanAccumulator> = BTreeMap::new();
    for (q, label) in quality.iter().zip(assignment.labels()) {
        if let Some(c) = label {
            per_cluster.entry(*c).or_default().push(*q);
        }
    }

    if global_quality == 0.0 {
        tracing::debug!(
            target: event_names::SCORE_ZERO_GLOBAL,
            "global quality is zero; every cluster gets the neutral score"
        );
    }

    let clusters: Vec<ClusterScore> = per_cluster
        .into_iter()
        .map(|(cluster_id, acc)| {
            let mean_quality = acc.mean().unwrap_or(0.0);
            let score = cluster_ratio(mean_quality, global_quality);
            ClusterScore {
                cluster_id,
                size: acc.count(),
                mean_quality,
                score,
            }
        })
        .collect();

    let by_id: BTreeMap<usize, f64> = clusters.iter().map(|c| (c.cluster_id, c.score)).collect();
    let scores: Vec<f64> = assignment
        .labels()
        .iter()
        .map(|label| {
            label
                .and_then(|c| by_id.get(&c).copied())
                .unwrap_or(NEUTRAL_SCORE)
        })
        .collect();
    let flags = scores.iter().map(|s| *s < threshold).collect();

    // Strict comparison over ascending ids keeps the lowest id on ties.
    let worst_cluster = clusters.iter().fold(None, |worst: Option<(usize, f64)>, c| match worst {
        Some((_, s)) if s <= c.score => worst,
        _ => Some((c.cluster_id, c.score)),
    });
    let summary_score = worst_cluster.map_or(NEUTRAL_SCORE, |(_, s)| s);

    GroupScores {
        global_quality,
        scores,
        flags,
        clusters,
        summary_score,
        worst_cluster,
        n_noise: assignment.n_noise(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assign(ids: &[i64]) -> ClusterAssignment {
        ClusterAssignment::from_raw(ids).unwrap()
    }

    #[test]
    fn equal_means_score_one() {
        let q = [0.5, 0.5, 0.5, 0.5];
        let out = score_groups(&q, &assign(&[0, 0, 1, 1]), 0.1);
        assert!(out.scores.iter().all(|s| *s == 1.0));
        assert_eq!(out.num_issues(), 0);
        assert_eq!(out.summary_score, 1.0);
    }

    #[test]
    fn low_cluster_is_flagged() {
        // global = (0.05 * 2 + 0.95 * 2) / 4 = 0.5; cluster 0 ratio 0.1
        let q = [0.05, 0.05, 0.95, 0.95];
        let out = score_groups(&q, &assign(&[0, 0, 1, 1]), 0.2);
        assert!((out.global_quality - 0.5).abs() < 1e-12);
        assert!((out.scores[0] - 0.1).abs() < 1e-12);
        assert_eq!(out.scores[2], 1.0);
        assert_eq!(out.flags, vec![true, true, false, false]);
        assert_eq!(out.worst_cluster.map(|(c, _)| c), Some(0));
        assert!((out.summary_score - 0.1).abs() < 1e-12);
    }

    #[test]
    fn noise_is_neutral_and_counts_toward_global() {
        let q = [0.0, 0.0, 1.0];
        let out = score_groups(&q, &assign(&[0, 0, -1]), 0.5);
        assert!((out.global_quality - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(out.scores, vec![0.0, 0.0, 1.0]);
        assert_eq!(out.flags, vec![true, true, false]);
        assert_eq!(out.n_noise, 1);
    }

    #[test]
    fn zero_global_mean_is_neutral() {
        let out = score_groups(&[0.0; 4], &assign(&[0, 0, 1, 1]), 0.5);
        assert!(out.scores.iter().all(|s| *s == 1.0));
        assert_eq!(out.num_issues(), 0);
    }

    #[test]
    fn uniform_quality_scores_exactly_one() {
        // 0.1 summed in different orders rounds differently
        let out = score_groups(&[0.1; 3], &assign(&[0, 1, 1]), 0.1);
        assert!(out.scores.iter().all(|s| *s == 1.0));
        assert_eq!(out.summary_score, 1.0);

        let q = [0.3; 7];
        let out = score_groups(&q, &assign(&[0, 0, 0, 1, 1, -1, 2]), 1.0);
        assert!(out.scores.iter().all(|s| *s == 1.0));
        assert_eq!(out.num_issues(), 0);
    }

    #[test]
    fn ratio_snaps_only_near_one() {
        assert_eq!(cluster_ratio(0.1, 0.1 + f64::EPSILON / 8.0), 1.0);
        assert!(cluster_ratio(0.5, 0.6) < 1.0);
        assert_eq!(cluster_ratio(0.9, 0.3), 1.0);
        assert_eq!(cluster_ratio(0.0, 0.0), 1.0);
    }

    #[test]
    fn all_noise_has_summary_one() {
        let out = score_groups(&[0.1, 0.2], &assign(&[-1, -1]), 0.5);
        assert!(out.clusters.is_empty());
        assert_eq!(out.summary_score, 1.0);
        assert_eq!(out.worst_cluster, None);
    }

    #[test]
    fn ties_pick_lowest_id() {
        let q = [0.1, 0.1, 0.9];
        let out = score_groups(&q, &assign(&[7, 3, 5]), 0.5);
        assert_eq!(out.worst_cluster.map(|(c, _)| c), Some(3));
    }

    #[test]
    fn non_contiguous_ids_are_ordered() {
        let out = score_groups(&[0.5, 0.5, 0.5], &assign(&[9, 2, 9]), 0.1);
        let ids: Vec<usize> = out.clusters.iter().map(|c| c.cluster_id).collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(out.clusters[1].size, 2);
    }
}
