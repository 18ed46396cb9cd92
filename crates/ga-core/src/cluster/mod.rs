//! Clustering of the feature space into candidate groups.
//!
//! A [`Clusterer`] turns a feature matrix into a [`ClusterAssignment`]: one
//! optional cluster id per example, `None` meaning noise. [`Hdbscan`] is the
//! default implementation; [`PrecomputedClusters`] replays ids supplied by
//! the caller.

pub mod hdbscan;

pub use hdbscan::Hdbscan;

use ga_common::{Error, Result};
use ga_math::{DistanceMetric, Matrix};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Wire sentinel for noise in raw cluster id arrays.
pub const NOISE_ID: i64 = -1;

/// Cluster membership for every example, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    labels: Vec<Option<usize>>,
    n_clusters: usize,
}

impl ClusterAssignment {
    /// Wrap per-example labels; `n_clusters` is the number of distinct ids.
    pub fn new(labels: Vec<Option<usize>>) -> Self {
        let n_clusters = labels
            .iter()
            .flatten()
            .collect::<std::collections::BTreeSet<_>>()
            .len();
        ClusterAssignment { labels, n_clusters }
    }

    /// Every example in cluster 0.
    pub fn single_cluster(n: usize) -> Self {
        ClusterAssignment {
            labels: vec![Some(0); n],
            n_clusters: usize::from(n > 0),
        }
    }

    /// Parse wire ids: non-negative ids are clusters, `-1` is noise.
    pub fn from_raw(ids: &[i64]) -> Result<Self> {
        let labels = ids
            .iter()
            .enumerate()
            .map(|(row, &id)| match id {
                NOISE_ID => Ok(None),
                id => usize::try_from(id)
                    .map(Some)
                    .map_err(|_| Error::InvalidClusterId { row, id }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(labels))
    }

    /// Wire ids, `-1` for noise.
    pub fn to_raw(&self) -> Vec<i64> {
        self.labels
            .iter()
            .map(|l| l.map_or(NOISE_ID, |c| c as i64))
            .collect()
    }

    pub fn labels(&self) -> &[Option<usize>] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of distinct non-noise clusters.
    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    /// Number of examples assigned to noise.
    pub fn n_noise(&self) -> usize {
        self.labels.iter().filter(|l| l.is_none()).count()
    }

    /// Members per cluster id, ordered by id.
    pub fn cluster_sizes(&self) -> BTreeMap<usize, usize> {
        let mut sizes = BTreeMap::new();
        for c in self.labels.iter().flatten() {
            *sizes.entry(*c).or_insert(0) += 1;
        }
        sizes
    }
}

/// A source of cluster assignments.
pub trait Clusterer {
    /// Algorithm name, used as the info-bundle key (e.g. `"HDBSCAN"`).
    fn name(&self) -> &'static str;

    /// Distance metric, if the algorithm uses one.
    fn metric(&self) -> Option<DistanceMetric>;

    /// Parameters to record in the info bundle.
    fn params(&self) -> Map<String, Value>;

    /// Whether `cluster` actually partitions the features.
    fn performs_clustering(&self) -> bool {
        true
    }

    /// Assign every example to a cluster or to noise.
    fn cluster(&self, features: Option<&Matrix>) -> Result<ClusterAssignment>;
}

/// Cluster ids supplied by the caller instead of computed.
#[derive(Debug, Clone)]
pub struct PrecomputedClusters {
    assignment: ClusterAssignment,
}

impl PrecomputedClusters {
    pub fn new(ids: &[i64]) -> Result<Self> {
        Ok(PrecomputedClusters {
            assignment: ClusterAssignment::from_raw(ids)?,
        })
    }
}

impl Clusterer for PrecomputedClusters {
    fn name(&self) -> &'static str {
        "precomputed"
    }

    fn metric(&self) -> Option<DistanceMetric> {
        None
    }

    fn params(&self) -> Map<String, Value> {
        Map::new()
    }

    fn performs_clustering(&self) -> bool {
        false
    }

    /// Features, if given, only have to agree on the number of rows.
    fn cluster(&self, features: Option<&Matrix>) -> Result<ClusterAssignment> {
        if let Some(features) = features {
            if features.rows() != self.assignment.len() {
                return Err(Error::ShapeMismatch {
                    what: "cluster_ids length".to_string(),
                    expected: features.rows(),
                    actual: self.assignment.len(),
                });
            }
        }
        Ok(self.assignment.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_roundtrip_keeps_noise() {
        let a = ClusterAssignment::from_raw(&[0, -1, 2, 2, -1]).unwrap();
        assert_eq!(a.labels(), &[Some(0), None, Some(2), Some(2), None]);
        assert_eq!(a.n_clusters(), 2);
        assert_eq!(a.n_noise(), 2);
        assert_eq!(a.to_raw(), vec![0, -1, 2, 2, -1]);
    }

    #[test]
    fn raw_rejects_other_negative_ids() {
        assert!(matches!(
            ClusterAssignment::from_raw(&[0, -2]),
            Err(Error::InvalidClusterId { row: 1, id: -2 })
        ));
    }

    #[test]
    fn cluster_sizes_ordered_by_id() {
        let a = ClusterAssignment::from_raw(&[3, 1, 3, -1, 1, 1]).unwrap();
        let sizes: Vec<_> = a.cluster_sizes().into_iter().collect();
        assert_eq!(sizes, vec![(1, 3), (3, 2)]);
    }

    #[test]
    fn single_cluster_has_no_noise() {
        let a = ClusterAssignment::single_cluster(4);
        assert_eq!(a.n_clusters(), 1);
        assert_eq!(a.n_noise(), 0);
        assert_eq!(ClusterAssignment::single_cluster(0).n_clusters(), 0);
    }

    #[test]
    fn precomputed_checks_row_count() {
        let pre = PrecomputedClusters::new(&[0, 0, 1]).unwrap();
        assert_eq!(pre.cluster(None).unwrap().n_clusters(), 2);
        let features = Matrix::zeros(2, 1);
        assert!(matches!(
            pre.cluster(Some(&features)),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(!pre.performs_clustering());
    }
}
