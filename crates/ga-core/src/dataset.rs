//! On-disk dataset format for `ga-core audit`.
//!
//! A dataset is one JSON object with row-aligned arrays:
//!
//! ```json
//! {
//!   "features": [[0.0, 1.0], [0.5, 1.0]],
//!   "pred_probs": [[0.9, 0.1], [0.2, 0.8]],
//!   "labels": [0, 1],
//!   "cluster_ids": [0, -1],
//!   "num_classes": 2
//! }
//! ```
//!
//! `features` may be omitted when `cluster_ids` is present.

use std::io::Read;
use std::path::Path;

use ga_common::{Error, Result};
use ga_math::{Matrix, ShapeError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::context::DatasetContext;
use crate::issue::IssueInputs;
use crate::synthetic::SyntheticDataset;

/// Path that means "read standard input".
pub const STDIN_PATH: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DatasetFile {
    /// N x D feature rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<Vec<f64>>>,
    /// N x K predicted class probabilities.
    pub pred_probs: Vec<Vec<f64>>,
    /// N integer labels in [0, K).
    pub labels: Vec<usize>,
    /// Precomputed cluster ids, -1 for noise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_ids: Option<Vec<i64>>,
    /// Number of classes; defaults to max(label) + 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_classes: Option<usize>,
}

/// Matrices built from a [`DatasetFile`], ready for analysis.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub context: DatasetContext,
    pub features: Option<Matrix>,
    pub pred_probs: Matrix,
    pub cluster_ids: Option<Vec<i64>>,
}

impl LoadedDataset {
    pub fn inputs(&self) -> IssueInputs<'_> {
        IssueInputs {
            features: self.features.as_ref(),
            pred_probs: Some(&self.pred_probs),
            cluster_ids: self.cluster_ids.as_deref(),
        }
    }
}

impl DatasetFile {
    /// Read from a file, or from stdin when `path` is `-`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = if path.as_os_str() == STDIN_PATH {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn num_examples(&self) -> usize {
        self.labels.len()
    }

    /// Build matrices and the dataset context.
    pub fn into_loaded(self) -> Result<LoadedDataset> {
        // Without an explicit count, the probability width defines the classes
        let num_classes = self
            .num_classes
            .or_else(|| self.pred_probs.first().map(Vec::len));
        let context = DatasetContext::new(self.labels, num_classes)?;
        let features = self
            .features
            .as_deref()
            .map(|rows| to_matrix(rows, "features"))
            .transpose()?;
        let pred_probs = to_matrix(&self.pred_probs, "pred_probs")?;
        Ok(LoadedDataset {
            context,
            features,
            pred_probs,
            cluster_ids: self.cluster_ids,
        })
    }
}

impl From<&SyntheticDataset> for DatasetFile {
    fn from(data: &SyntheticDataset) -> Self {
        DatasetFile {
            features: Some(data.features.to_rows()),
            pred_probs: data.pred_probs.to_rows(),
            labels: data.labels.clone(),
            cluster_ids: None,
            num_classes: Some(data.num_classes()),
        }
    }
}

fn to_matrix(rows: &[Vec<f64>], name: &str) -> Result<Matrix> {
    Matrix::from_rows(rows).map_err(|e| match e {
        ShapeError::Ragged {
            row,
            expected,
            actual,
        } => Error::ShapeMismatch {
            what: format!("{} row {} width", name, row),
            expected,
            actual,
        },
        ShapeError::DataLength { rows, cols, actual } => Error::ShapeMismatch {
            what: name.to_string(),
            expected: rows * cols,
            actual,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"{
        "features": [[0.0, 1.0], [0.5, 1.0]],
        "pred_probs": [[0.9, 0.1], [0.2, 0.8]],
        "labels": [0, 1]
    }"#;

    #[test]
    fn parses_and_converts() {
        let file = DatasetFile::from_json(SMALL).unwrap();
        assert_eq!(file.num_examples(), 2);
        let loaded = file.into_loaded().unwrap();
        assert_eq!(loaded.context.num_classes(), 2);
        assert_eq!(loaded.features.as_ref().map(|f| f.cols()), Some(2));
        let inputs = loaded.inputs();
        assert!(inputs.cluster_ids.is_none());
        assert_eq!(inputs.pred_probs.map(|p| p.rows()), Some(2));
    }

    #[test]
    fn num_classes_defaults_to_probability_width() {
        let json = r#"{"pred_probs": [[0.9, 0.05, 0.05], [0.8, 0.1, 0.1]], "labels": [0, 1]}"#;
        let loaded = DatasetFile::from_json(json).unwrap().into_loaded().unwrap();
        assert_eq!(loaded.context.num_classes(), 3);

        let json = r#"{"pred_probs": [[0.5, 0.5]], "labels": [2]}"#;
        let err = DatasetFile::from_json(json).unwrap().into_loaded().unwrap_err();
        assert!(matches!(err, Error::InvalidLabel { row: 0, label: 2, num_classes: 2 }));
    }

    #[test]
    fn ragged_rows_are_shape_errors() {
        let json = r#"{"pred_probs": [[0.5, 0.5], [1.0]], "labels": [0, 1]}"#;
        let err = DatasetFile::from_json(json)
            .unwrap()
            .into_loaded()
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let json = r#"{"pred_probs": [], "labels": [], "weights": []}"#;
        assert!(matches!(DatasetFile::from_json(json), Err(Error::Json(_))));
    }

    #[test]
    fn empty_labels_are_rejected() {
        let json = r#"{"pred_probs": [], "labels": []}"#;
        let err = DatasetFile::from_json(json).unwrap().into_loaded().unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, SMALL).unwrap();
        assert_eq!(DatasetFile::load(&path).unwrap().labels, vec![0, 1]);
    }
}
