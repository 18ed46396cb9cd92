//! Group audit common types, IDs, and errors.
//!
//! This crate provides foundational types shared across the group audit crates:
//! - Run identity for log and report correlation
//! - Schema versioning
//! - Common error types with stable codes
//! - Output format definitions

pub mod error;
pub mod id;
pub mod output;
pub mod schema;

pub use error::{
    format_error_human, Error, ErrorCategory, Result, StructuredError, SuggestedAction,
};
pub use id::RunId;
pub use output::OutputFormat;
pub use schema::SCHEMA_VERSION;
