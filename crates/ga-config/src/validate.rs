//! Configuration validation errors and semantic validation.

use thiserror::Error;

use crate::analyzer::AnalyzerConfig;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: String, actual: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    ///
    /// Matches the code of the [`ga_common::Error`] this converts into.
    pub fn code(&self) -> u32 {
        ga_common::Error::from(self.clone()).code()
    }
}

impl From<ValidationError> for ga_common::Error {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::IoError(msg) => ga_common::Error::Io(std::io::Error::other(msg)),
            ValidationError::ParseError(msg) => ga_common::Error::Config(msg),
            ValidationError::InvalidValue { field, message } => {
                ga_common::Error::InvalidConfig { field, message }
            }
            ValidationError::VersionMismatch { expected, actual } => {
                ga_common::Error::SchemaVersion { expected, actual }
            }
        }
    }
}

/// Validate an analyzer config semantically.
pub fn validate_config(config: &AnalyzerConfig) -> ValidationResult<()> {
    if !ga_common::schema::is_compatible(&config.schema_version) {
        return Err(ValidationError::VersionMismatch {
            expected: crate::CONFIG_SCHEMA_VERSION.to_string(),
            actual: config.schema_version.clone(),
        });
    }

    validate_open_unit("threshold", config.threshold)?;
    validate_open_unit("probability_tolerance", config.probability_tolerance)?;

    let clustering = &config.clustering;
    if clustering.min_cluster_size < 2 {
        return Err(ValidationError::InvalidValue {
            field: "clustering.min_cluster_size".to_string(),
            message: format!("Must be at least 2, got {}", clustering.min_cluster_size),
        });
    }
    if clustering.min_samples == Some(0) {
        return Err(ValidationError::InvalidValue {
            field: "clustering.min_samples".to_string(),
            message: "Must be at least 1, got 0".to_string(),
        });
    }

    Ok(())
}

/// Value must be a finite number strictly between 0 and 1.
fn validate_open_unit(field: &str, value: f64) -> ValidationResult<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("Must be in (0, 1), got {}", value),
        });
    }
    Ok(())
}
