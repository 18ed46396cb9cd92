//! Per-example prediction quality.
//!
//! Quality is the self-confidence `p[y]`: the probability the model assigned
//! to the example's given label. It lies in [0, 1], higher is better.

use ga_common::{Error, Result};
use ga_math::{check_distribution, Matrix};

/// Check `pred_probs` has exactly `num_classes` columns and every row is a
/// distribution.
pub fn validate_pred_probs(pred_probs: &Matrix, num_classes: usize, tolerance: f64) -> Result<()> {
    if pred_probs.cols() != num_classes {
        return Err(Error::ShapeMismatch {
            what: "pred_probs columns".to_string(),
            expected: num_classes,
            actual: pred_probs.cols(),
        });
    }
    for (row, p) in pred_probs.iter_rows().enumerate() {
        check_distribution(p, tolerance).map_err(|violation| Error::InvalidDistribution {
            row,
            reason: violation.to_string(),
        })?;
    }
    Ok(())
}

/// Self-confidence of each example: `pred_probs[i][labels[i]]`.
///
/// Assumes shapes were validated; a label beyond the row width is reported
/// as [`Error::InvalidLabel`] rather than panicking.
pub fn self_confidence(pred_probs: &Matrix, labels: &[usize]) -> Result<Vec<f64>> {
    if pred_probs.rows() != labels.len() {
        return Err(Error::ShapeMismatch {
            what: "pred_probs rows".to_string(),
            expected: labels.len(),
            actual: pred_probs.rows(),
        });
    }
    labels
        .iter()
        .enumerate()
        .map(|(row, &label)| {
            pred_probs
                .row(row)
                .get(label)
                .copied()
                .ok_or(Error::InvalidLabel {
                    row,
                    label,
                    num_classes: pred_probs.cols(),
                })
        })
        .collect()
}
