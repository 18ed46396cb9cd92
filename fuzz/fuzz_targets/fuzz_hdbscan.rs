//! Fuzz target for HDBSCAN on arbitrary finite points.
//!
//! Labels must cover every row and every cluster must reach the minimum size.

#![no_main]

use arbitrary::Arbitrary;
use ga_core::cluster::Hdbscan;
use ga_math::Matrix;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    min_cluster_size: u8,
    leaf: bool,
    points: Vec<(i16, i16)>,
}

fuzz_target!(|input: Input| {
    if input.points.len() > 128 {
        return;
    }
    let rows: Vec<Vec<f64>> = input
        .points
        .iter()
        .map(|(x, y)| vec![f64::from(*x) / 16.0, f64::from(*y) / 16.0])
        .collect();
    let Ok(features) = Matrix::from_rows(&rows) else {
        return;
    };

    let mut hdbscan = Hdbscan::default();
    hdbscan.min_cluster_size = usize::from(input.min_cluster_size % 16).max(2);
    if input.leaf {
        hdbscan.selection = ga_config::ClusterSelectionMethod::Leaf;
    }
    let assignment = hdbscan.fit(&features);

    assert_eq!(assignment.len(), rows.len());
    if assignment.n_clusters() > 1 {
        for size in assignment.cluster_sizes().values() {
            assert!(*size >= hdbscan.min_cluster_size);
        }
    }
});
