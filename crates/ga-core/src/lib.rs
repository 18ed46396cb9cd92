//! Group Audit Core Library
//!
//! This library provides the core functionality for group auditing:
//! - Density-based clustering (HDBSCAN)
//! - Per-example quality and per-cluster performance ratios
//! - The issue manager abstraction and its registry
//! - Dataset loading, synthetic datasets and audit envelopes
//! - Exit codes, structured logging and JSON Schemas for the CLI
//!
//! The binary entry point is in `main.rs`.

pub mod cluster;
pub mod context;
pub mod dataset;
pub mod exit_codes;
pub mod issue;
pub mod logging;
pub mod quality;
pub mod run;
pub mod schema;
pub mod scoring;
pub mod synthetic;
