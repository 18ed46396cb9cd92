//! Probability-simplex checks for predicted probability rows.

use thiserror::Error;

use super::stable::neumaier_sum;

/// Why a vector is not a valid probability distribution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimplexViolation {
    #[error("probability vector is empty")]
    Empty,
    #[error("entry {index} is not finite ({value})")]
    NonFinite { index: usize, value: f64 },
    #[error("entry {index} is negative ({value})")]
    Negative { index: usize, value: f64 },
    #[error("entries sum to {sum}, expected 1 within {tolerance}")]
    BadSum { sum: f64, tolerance: f64 },
}

/// Check that `p` is non-negative and sums to one within `tolerance`.
pub fn check_distribution(p: &[f64], tolerance: f64) -> Result<(), SimplexViolation> {
    if p.is_empty() {
        return Err(SimplexViolation::Empty);
    }
    for (index, &value) in p.iter().enumerate() {
        if !value.is_finite() {
            return Err(SimplexViolation::NonFinite { index, value });
        }
        if value < 0.0 {
            return Err(SimplexViolation::Negative { index, value });
        }
    }
    let sum = neumaier_sum(p);
    if (sum - 1.0).abs() > tolerance {
        return Err(SimplexViolation::BadSum { sum, tolerance });
    }
    Ok(())
}
