//! Synthetic blob datasets for demos, tests and benchmarks.
//!
//! Each blob is one class. Predictions put `label_weight` on the true class
//! and `1 - label_weight` on every other class, then normalize, so every
//! example has the same self-confidence. Swapping two probability columns
//! for one class turns that blob into an underperforming group.

use ga_math::Matrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Well-separated 2-D blob centers.
pub const DEFAULT_CENTERS: &[(f64, f64)] = &[(0.0, 0.0), (15.0, 2.0), (3.0, 25.0), (30.0, 30.0)];

/// How points are laid out around each center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlobLayout {
    /// Regular `rows x cols` grid anchored at the center.
    Lattice { rows: usize, cols: usize, spacing: f64 },
    /// Isotropic normal samples.
    Gaussian { per_blob: usize, std_dev: f64 },
}

impl Default for BlobLayout {
    fn default() -> Self {
        BlobLayout::Lattice {
            rows: 5,
            cols: 10,
            spacing: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthOptions {
    pub centers: Vec<(f64, f64)>,
    pub layout: BlobLayout,
    pub label_weight: f64,
    /// Class whose rows get their own column swapped with the next class's.
    pub swap_class: Option<usize>,
    pub seed: u64,
}

impl Default for SynthOptions {
    fn default() -> Self {
        SynthOptions {
            centers: DEFAULT_CENTERS.to_vec(),
            layout: BlobLayout::default(),
            label_weight: 0.9,
            swap_class: None,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticDataset {
    pub features: Matrix,
    pub pred_probs: Matrix,
    pub labels: Vec<usize>,
}

impl SyntheticDataset {
    pub fn num_classes(&self) -> usize {
        self.pred_probs.cols()
    }
}

/// Grid points `center + (c * spacing, r * spacing)`, blob by blob.
pub fn lattice_blob_points(
    centers: &[(f64, f64)],
    rows: usize,
    cols: usize,
    spacing: f64,
) -> Vec<Vec<f64>> {
    let mut points = Vec::with_capacity(centers.len() * rows * cols);
    for &(cx, cy) in centers {
        for r in 0..rows {
            for c in 0..cols {
                points.push(vec![cx + c as f64 * spacing, cy + r as f64 * spacing]);
            }
        }
    }
    points
}

/// Normal samples around each center (Box-Muller), blob by blob.
pub fn gaussian_blob_points<R: Rng>(
    centers: &[(f64, f64)],
    per_blob: usize,
    std_dev: f64,
    rng: &mut R,
) -> Vec<Vec<f64>> {
    let mut points = Vec::with_capacity(centers.len() * per_blob);
    for &(cx, cy) in centers {
        for _ in 0..per_blob {
            let u1: f64 = 1.0 - rng.random::<f64>();
            let u2: f64 = rng.random::<f64>();
            let radius = (-2.0 * u1.ln()).sqrt() * std_dev;
            let theta = std::f64::consts::TAU * u2;
            points.push(vec![cx + radius * theta.cos(), cy + radius * theta.sin()]);
        }
    }
    points
}

/// Rows with `label_weight` on the label and `1 - label_weight` elsewhere, normalized.
pub fn confident_pred_probs(labels: &[usize], num_classes: usize, label_weight: f64) -> Matrix {
    let other = 1.0 - label_weight;
    let mut probs = Matrix::zeros(labels.len(), num_classes);
    for (i, &label) in labels.iter().enumerate() {
        let row = probs.row_mut(i);
        row.fill(other);
        if let Some(p) = row.get_mut(label) {
            *p = label_weight;
        }
        let total: f64 = row.iter().sum();
        if total > 0.0 {
            row.iter_mut().for_each(|p| *p /= total);
        }
    }
    probs
}

/// Swap columns `a` and `b` in every row labeled `class`.
pub fn swap_class_columns(pred_probs: &mut Matrix, labels: &[usize], class: usize, a: usize, b: usize) {
    if a >= pred_probs.cols() || b >= pred_probs.cols() {
        return;
    }
    for (i, &label) in labels.iter().enumerate() {
        if label == class {
            pred_probs.row_mut(i).swap(a, b);
        }
    }
}

/// Build a dataset. Deterministic for a fixed seed.
pub fn generate(options: &SynthOptions) -> SyntheticDataset {
    let points = match options.layout {
        BlobLayout::Lattice {
            rows,
            cols,
            spacing,
        } => lattice_blob_points(&options.centers, rows, cols, spacing),
        BlobLayout::Gaussian { per_blob, std_dev } => {
            let mut rng = StdRng::seed_from_u64(options.seed);
            gaussian_blob_points(&options.centers, per_blob, std_dev, &mut rng)
        }
    };
    let per_blob = points.len() / options.centers.len().max(1);
    let labels: Vec<usize> = (0..points.len()).map(|i| i / per_blob.max(1)).collect();
    let num_classes = options.centers.len().max(1);

    let mut pred_probs = confident_pred_probs(&labels, num_classes, options.label_weight);
    if let Some(class) = options.swap_class {
        swap_class_columns(
            &mut pred_probs,
            &labels,
            class,
            class,
            (class + 1) % num_classes,
        );
    }

    let features = Matrix::from_rows(&points).unwrap_or_else(|_| Matrix::zeros(0, 2));
    SyntheticDataset {
        features,
        pred_probs,
        labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lattice_layout() {
        let pts = lattice_blob_points(&[(1.0, 2.0)], 2, 3, 0.5);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], vec![1.0, 2.0]);
        assert_eq!(pts[5], vec![2.0, 2.5]);
    }

    #[test]
    fn confident_rows_are_distributions() {
        let probs = confident_pred_probs(&[0, 3], 4, 0.9);
        for row in probs.iter_rows() {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        assert!((probs.get(0, 0) - 0.75).abs() < 1e-12);
        assert!((probs.get(1, 0) - 0.1 / 1.2).abs() < 1e-12);
    }

    #[test]
    fn default_dataset_shape() {
        let data = generate(&SynthOptions::default());
        assert_eq!(data.features.rows(), 200);
        assert_eq!(data.features.cols(), 2);
        assert_eq!(data.num_classes(), 4);
        assert_eq!(data.labels[49], 0);
        assert_eq!(data.labels[50], 1);
    }

    #[test]
    fn swap_lowers_one_class() {
        let data = generate(&SynthOptions {
            swap_class: Some(0),
            ..SynthOptions::default()
        });
        assert!((data.pred_probs.get(0, 0) - 1.0 / 12.0).abs() < 1e-12);
        assert!((data.pred_probs.get(0, 1) - 0.75).abs() < 1e-12);
        assert!((data.pred_probs.get(60, 1) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn gaussian_is_seeded() {
        let opts = SynthOptions {
            layout: BlobLayout::Gaussian {
                per_blob: 20,
                std_dev: 1.0,
            },
            seed: 7,
            ..SynthOptions::default()
        };
        assert_eq!(generate(&opts), generate(&opts));
        assert_eq!(generate(&opts).features.rows(), 80);
    }
}
