//! Exit codes for the ga-core CLI.
//!
//! Exit codes communicate the audit outcome without requiring output parsing.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes (clean / issues found)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Internal errors (bugs, should be reported)

use ga_common::{Error, ErrorCategory};

/// Exit codes for ga-core operations.
///
/// These codes are a stable contract for automation. Changes require
/// a major version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Operational Outcomes (0-1)
    // ========================================================================
    /// Audit ran and flagged nothing
    Clean = 0,

    /// Audit ran and flagged at least one example
    IssuesFound = 1,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments
    ArgsError = 10,

    /// Config file missing, malformed or semantically invalid
    ConfigError = 11,

    /// Dataset rejected by input validation
    InputError = 12,

    /// Config or dataset written by an incompatible schema version
    VersionError = 13,

    // ========================================================================
    // Internal Errors (20-29)
    // ========================================================================
    /// Internal error (bug - please report)
    InternalError = 20,

    /// I/O error
    IoError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Exit code for a finished audit.
    pub fn from_issue_count(num_issues: usize) -> Self {
        if num_issues == 0 {
            ExitCode::Clean
        } else {
            ExitCode::IssuesFound
        }
    }

    /// Check if this exit code indicates operational outcome (codes 0-1).
    /// These are not errors - they communicate the audit result.
    pub fn is_operational(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        (10..20).contains(&(self as i32))
    }

    /// Check if this exit code is an internal error (codes 20-29).
    pub fn is_internal_error(self) -> bool {
        (self as i32) >= 20
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::IssuesFound => "OK_ISSUES",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InputError => "ERR_INPUT",
            ExitCode::VersionError => "ERR_VERSION",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        if matches!(err, Error::SchemaVersion { .. }) {
            return ExitCode::VersionError;
        }
        if matches!(err, Error::Json(_)) {
            return ExitCode::InputError;
        }
        if matches!(err, Error::UnknownIssueType { .. }) {
            return ExitCode::ArgsError;
        }
        match err.category() {
            ErrorCategory::Config => ExitCode::ConfigError,
            ErrorCategory::Input => ExitCode::InputError,
            ErrorCategory::Analysis => ExitCode::InternalError,
            ErrorCategory::Io => ExitCode::IoError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_count_mapping() {
        assert_eq!(ExitCode::from_issue_count(0), ExitCode::Clean);
        assert_eq!(ExitCode::from_issue_count(7), ExitCode::IssuesFound);
        assert!(ExitCode::IssuesFound.is_operational());
    }

    #[test]
    fn test_error_mapping() {
        let shape = Error::ShapeMismatch {
            what: "labels".into(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(ExitCode::from(&shape), ExitCode::InputError);
        assert_eq!(
            ExitCode::from(&Error::Config("bad".into())),
            ExitCode::ConfigError
        );
        assert_eq!(
            ExitCode::from(&Error::Analysis("bug".into())),
            ExitCode::InternalError
        );
        assert_eq!(
            ExitCode::from(&Error::InvalidClusterId { row: 1, id: -2 }),
            ExitCode::InputError
        );
        assert_eq!(
            ExitCode::from(&Error::SchemaVersion {
                expected: "1.0.0".into(),
                actual: "2.0.0".into()
            }),
            ExitCode::VersionError
        );
        assert_eq!(
            ExitCode::from(&Error::UnknownIssueType {
                name: "outlier".into()
            }),
            ExitCode::ArgsError
        );
    }

    #[test]
    fn test_ranges() {
        assert!(ExitCode::ConfigError.is_user_error());
        assert!(ExitCode::IoError.is_internal_error());
        assert!(!ExitCode::Clean.is_user_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(ExitCode::IssuesFound.to_string(), "OK_ISSUES (1)");
    }
}
