//! Structured logging foundation for ga-core.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for agent and pipeline workflows
//!
//! # Usage
//!
//! ```ignore
//! use ga_core::logging::{init_logging, LogConfig, LogContext, LogOverrides, Stage, event_names};
//!
//! // Initialize at startup
//! let config = LogConfig::from_env(LogOverrides::default());
//! init_logging(&config);
//!
//! // Create context for consistent correlation IDs
//! let ctx = LogContext::new(run_id.to_string()).with_dataset_id("data.json");
//!
//! // Emit structured events
//! ga_core::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "Starting audit");
//! ```
//!
//! # Design Notes
//!
//! - stdout is reserved for command payloads (JSON/MD output)
//! - stderr receives all log output (human or JSONL)
//! - Log events include correlation IDs (run_id, dataset_id)
//! - Library code logs with plain `tracing` macros; the CLI wraps the run in
//!   a span carrying the correlation IDs, which the JSONL layer attaches

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel, LogOverrides};
pub use events::{event_names, LogContext, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. Valid
/// `RUST_LOG` directives in `config` replace its level. Calling it a second
/// time is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = config
        .directives
        .as_deref()
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(config.level.to_string()));

    let result = match config.format {
        LogFormat::Human => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(config.ansi && std::io::stderr().is_terminal());
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        LogFormat::Jsonl => tracing_subscriber::registry()
            .with(filter)
            .with(JsonlLayer::new(std::io::stderr()))
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("logging already initialized");
    }
}

/// Convenience macro for structured event logging with context.
///
/// Usage:
/// ```ignore
/// log_event!(ctx, INFO, "run.started", Stage::Init, "Starting audit");
/// log_event!(ctx, INFO, "run.finished", Stage::Report, "Audit complete",
///     num_issues = 12, exit_code = 1);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            target: $event,
            run_id = %$ctx.run_id,
            dataset_id = $ctx.dataset_id.as_deref().unwrap_or("-"),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            target: $event,
            run_id = %$ctx.run_id,
            dataset_id = $ctx.dataset_id.as_deref().unwrap_or("-"),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            target: $event,
            run_id = %$ctx.run_id,
            dataset_id = $ctx.dataset_id.as_deref().unwrap_or("-"),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            target: $event,
            run_id = %$ctx.run_id,
            dataset_id = $ctx.dataset_id.as_deref().unwrap_or("-"),
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_is_harmless() {
        let config = LogConfig {
            level: LogLevel::Off,
            ..LogConfig::default()
        };
        init_logging(&config);
        init_logging(&config);
    }

    #[test]
    fn test_log_event_macro_expands() {
        let ctx = LogContext::new("ga-20261019-143022-a7xq");
        crate::log_event!(
            ctx,
            DEBUG,
            event_names::SCORE_FINISHED,
            Stage::Score,
            "scored",
            n_clusters = 3u64
        );
    }

    #[test]
    fn test_stage_serialization() {
        assert_eq!(serde_json::to_string(&Stage::Cluster).unwrap(), "\"cluster\"");
        assert_eq!(serde_json::to_string(&Stage::Score).unwrap(), "\"score\"");
    }
}
