//! Logging configuration.
//!
//! Sources, lowest precedence first:
//! - `GA_LOG` (level) and `GA_LOG_FORMAT`
//! - `RUST_LOG` directives, used verbatim by the filter when `GA_LOG` is unset
//! - CLI flags: `-v` / `-q`, a machine-readable `--format`, `--no-color`
//!
//! `NO_COLOR` (any value) disables ANSI output in the human format.

use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    /// Completely silent.
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        };
        write!(f, "{}", s)
    }
}

/// Command-line inputs to logging setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOverrides {
    /// Level from `-v` / `-q`, see [`LogConfig::level_from_verbosity`].
    pub level: Option<LogLevel>,
    /// Forced format, set when the payload format is machine-readable.
    pub format: Option<LogFormat>,
    /// `--no-color`.
    pub no_color: bool,
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Level used when `directives` is absent or unparsable.
    pub level: LogLevel,
    /// Raw `RUST_LOG` filter directives.
    pub directives: Option<String>,
    /// Whether the human format may emit ANSI colors.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            level: LogLevel::Info,
            directives: None,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Resolve from the process environment and CLI overrides.
    pub fn from_env(overrides: LogOverrides) -> Self {
        Self::resolve(|key| std::env::var(key).ok(), overrides)
    }

    /// Resolve from an arbitrary variable lookup.
    pub fn resolve<F>(lookup: F, overrides: LogOverrides) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        match lookup("GA_LOG") {
            Some(val) => {
                if let Ok(level) = val.parse() {
                    config.level = level;
                }
            }
            None => config.directives = lookup("RUST_LOG").filter(|d| !d.trim().is_empty()),
        }

        if let Some(format) = lookup("GA_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            config.format = format;
        }

        // An explicit -v / -q beats any environment filter
        if let Some(level) = overrides.level {
            config.level = level;
            config.directives = None;
        }
        if let Some(format) = overrides.format {
            config.format = format;
        }
        config.ansi = !overrides.no_color && lookup("NO_COLOR").is_none();

        config
    }

    /// Map `-v` / `-q` onto a level override. `-q` keeps only errors.
    pub fn level_from_verbosity(verbose: u8, quiet: bool) -> Option<LogLevel> {
        if quiet {
            return Some(LogLevel::Error);
        }
        match verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve(vars: &[(&str, &str)], overrides: LogOverrides) -> LogConfig {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogConfig::resolve(|key| env.get(key).cloned(), overrides)
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("JSONL".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("quiet".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Off.to_string(), "off");
    }

    #[test]
    fn test_level_from_verbosity() {
        assert_eq!(LogConfig::level_from_verbosity(0, false), None);
        assert_eq!(LogConfig::level_from_verbosity(1, false), Some(LogLevel::Debug));
        assert_eq!(LogConfig::level_from_verbosity(9, false), Some(LogLevel::Trace));
        assert_eq!(LogConfig::level_from_verbosity(3, true), Some(LogLevel::Error));
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(resolve(&[], LogOverrides::default()), LogConfig::default());
    }

    #[test]
    fn ga_log_wins_over_rust_log() {
        let config = resolve(
            &[("GA_LOG", "warn"), ("RUST_LOG", "ga_core=trace")],
            LogOverrides::default(),
        );
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.directives, None);
    }

    #[test]
    fn rust_log_is_kept_as_directives() {
        let config = resolve(&[("RUST_LOG", "off")], LogOverrides::default());
        assert_eq!(config.directives.as_deref(), Some("off"));
        assert_eq!(config.level, LogLevel::Info);
    }

    #[test]
    fn verbosity_flag_replaces_environment_filter() {
        let config = resolve(
            &[("RUST_LOG", "off")],
            LogOverrides {
                level: Some(LogLevel::Debug),
                ..LogOverrides::default()
            },
        );
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.directives, None);
    }

    #[test]
    fn machine_format_override_beats_env_format() {
        let config = resolve(
            &[("GA_LOG_FORMAT", "human")],
            LogOverrides {
                format: Some(LogFormat::Jsonl),
                ..LogOverrides::default()
            },
        );
        assert_eq!(config.format, LogFormat::Jsonl);
        assert_eq!(
            resolve(&[("GA_LOG_FORMAT", "jsonl")], LogOverrides::default()).format,
            LogFormat::Jsonl
        );
    }

    #[test]
    fn no_color_flag_or_env_disables_ansi() {
        let flag = LogOverrides {
            no_color: true,
            ..LogOverrides::default()
        };
        assert!(!resolve(&[], flag).ansi);
        assert!(!resolve(&[("NO_COLOR", "1")], LogOverrides::default()).ansi);
        assert!(resolve(&[], LogOverrides::default()).ansi);
    }
}
