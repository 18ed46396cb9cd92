//! Read-only dataset context shared by analyzers.
//!
//! Analyzers borrow a [`DatasetContext`] for their whole lifetime; it holds
//! the ground-truth labels and summary statistics, and is never mutated by
//! an analysis.

use ga_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Summary statistics about the labeled dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetStatistics {
    pub num_examples: usize,
    pub num_classes: usize,
    /// Number of examples per class, indexed by class.
    pub class_counts: Vec<usize>,
}

/// Labels plus statistics for one dataset.
#[derive(Debug, Clone)]
pub struct DatasetContext {
    labels: Vec<usize>,
    statistics: DatasetStatistics,
}

impl DatasetContext {
    /// Build a context from integer labels.
    ///
    /// `num_classes` defaults to `max(label) + 1`. When given, every label
    /// must be below it.
    pub fn new(labels: Vec<usize>, num_classes: Option<usize>) -> Result<Self> {
        if labels.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let observed = labels.iter().copied().max().map_or(0, |m| m + 1);
        let num_classes = num_classes.unwrap_or(observed);
        if let Some((row, &label)) = labels.iter().enumerate().find(|(_, &l)| l >= num_classes) {
            return Err(Error::InvalidLabel {
                row,
                label,
                num_classes,
            });
        }

        let mut class_counts = vec![0usize; num_classes];
        for &label in &labels {
            class_counts[label] += 1;
        }

        let statistics = DatasetStatistics {
            num_examples: labels.len(),
            num_classes,
            class_counts,
        };
        Ok(DatasetContext { labels, statistics })
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn num_examples(&self) -> usize {
        self.statistics.num_examples
    }

    pub fn num_classes(&self) -> usize {
        self.statistics.num_classes
    }

    pub fn statistics(&self) -> &DatasetStatistics {
        &self.statistics
    }
}
