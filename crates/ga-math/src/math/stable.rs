//! Numerically stable reductions.
//!
//! Quality averages are ratios of sums over thousands of values in [0, 1];
//! Neumaier-compensated summation keeps those sums independent of the order
//! in which examples arrive.

/// Compensated (Neumaier) sum of a slice.
///
/// Returns 0.0 for empty input. NaN propagates.
pub fn neumaier_sum(values: &[f64]) -> f64 {
    let mut acc = MeanAccumulator::new();
    for &v in values {
        acc.push(v);
    }
    acc.sum()
}

/// Arithmetic mean with compensated summation.
///
/// Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    let mut acc = MeanAccumulator::new();
    for &v in values {
        acc.push(v);
    }
    acc.mean()
}

/// Streaming compensated sum and count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeanAccumulator {
    sum: f64,
    compensation: f64,
    count: usize,
}

impl MeanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value.
    pub fn push(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
        self.count += 1;
    }

    /// Number of values pushed so far.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Compensated total.
    pub fn sum(&self) -> f64 {
        self.sum + self.compensation
    }

    /// Mean of the pushed values, `None` if nothing was pushed.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum() / self.count as f64)
        }
    }
}

impl Extend<f64> for MeanAccumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for v in iter {
            self.push(v);
        }
    }
}

impl FromIterator<f64> for MeanAccumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = MeanAccumulator::new();
        acc.extend(iter);
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        if a.is_nan() || b.is_nan() {
            return false;
        }
        (a - b).abs() <= tol
    }

    #[test]
    fn neumaier_sum_empty_is_zero() {
        assert_eq!(neumaier_sum(&[]), 0.0);
    }

    #[test]
    fn neumaier_sum_recovers_cancellation() {
        // Naive left-to-right summation returns 0.0 here.
        let v = [1.0, 1e100, 1.0, -1e100];
        assert_eq!(neumaier_sum(&v), 2.0);
    }

    #[test]
    fn neumaier_sum_many_small_terms() {
        let v = vec![0.1; 10_000];
        assert!(approx_eq(neumaier_sum(&v), 1000.0, 1e-10));
    }

    #[test]
    fn mean_empty_is_none() {
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn mean_basic() {
        let m = mean(&[0.25, 0.75, 0.5]).unwrap();
        assert!(approx_eq(m, 0.5, 1e-15));
    }

    #[test]
    fn mean_nan_propagates() {
        let m = mean(&[0.25, f64::NAN]).unwrap();
        assert!(m.is_nan());
    }

    #[test]
    fn accumulator_matches_slice_mean() {
        let values = [0.9, 0.1, 0.3, 0.7, 0.5];
        let acc: MeanAccumulator = values.iter().copied().collect();
        assert_eq!(acc.count(), 5);
        assert_eq!(acc.mean(), mean(&values));
    }
}
