//! Distance metrics over feature vectors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::matrix::Matrix;

/// Supported distance functions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// L2 distance (default).
    #[default]
    Euclidean,
    /// L1 distance.
    Manhattan,
    /// L-infinity distance.
    Chebyshev,
    /// One minus cosine similarity, in [0, 2].
    Cosine,
}

impl DistanceMetric {
    pub const ALL: &'static [DistanceMetric] = &[
        DistanceMetric::Euclidean,
        DistanceMetric::Manhattan,
        DistanceMetric::Chebyshev,
        DistanceMetric::Cosine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Manhattan => "manhattan",
            DistanceMetric::Chebyshev => "chebyshev",
            DistanceMetric::Cosine => "cosine",
        }
    }

    /// Distance between two equal-length vectors.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            DistanceMetric::Chebyshev => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max),
            DistanceMetric::Cosine => cosine_distance(a, b),
        }
    }
}

const COSINE_ZERO: f64 = 4.0 * f64::EPSILON;

fn cosine_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    match (norm_a == 0.0, norm_b == 0.0) {
        (true, true) => 0.0,
        (true, false) | (false, true) => 1.0,
        (false, false) => {
            let d = 1.0 - dot / (norm_a.sqrt() * norm_b.sqrt());
            // Parallel vectors can miss 0 by rounding
            if d <= COSINE_ZERO {
                0.0
            } else {
                d.min(2.0)
            }
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "euclidean" | "l2" => Ok(DistanceMetric::Euclidean),
            "manhattan" | "cityblock" | "l1" => Ok(DistanceMetric::Manhattan),
            "chebyshev" | "linf" => Ok(DistanceMetric::Chebyshev),
            "cosine" => Ok(DistanceMetric::Cosine),
            _ => Err(format!("unknown distance metric: {}", s)),
        }
    }
}

/// Full symmetric `n x n` distance matrix between the rows of `points`.
///
/// O(n² · d) time and O(n²) memory.
pub fn pairwise_distances(points: &Matrix, metric: DistanceMetric) -> Matrix {
    let n = points.rows();
    let mut out = Matrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = metric.distance(points.row(i), points.row(j));
            out.set(i, j, d);
            out.set(j, i, d);
        }
    }
    out
}
