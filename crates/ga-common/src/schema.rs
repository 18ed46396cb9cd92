//! Schema versioning for audit reports and config files.

/// Version of the JSON envelope emitted by the CLI and of the config format.
///
/// Bump the minor version for additive fields, the major for renames.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Whether a document written with `version` can be read by this build.
///
/// Only the major component has to match.
pub fn is_compatible(version: &str) -> bool {
    let major = |v: &str| v.split('.').next().map(str::to_string);
    major(version).is_some() && major(version) == major(SCHEMA_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_major_is_compatible() {
        assert!(is_compatible("1.0.0"));
        assert!(is_compatible("1.4.2"));
    }

    #[test]
    fn test_other_major_is_incompatible() {
        assert!(!is_compatible("2.0.0"));
        assert!(!is_compatible("0.9.0"));
    }
}
