//! # Structured Logging
//!
//! Subscriber setup for the `tracing` events emitted by the synthesis
//! stages, with JSON, Pretty and Compact output.
//!
//! ```rust,ignore
//! use pta_core::observe::{init_logging, LogConfig, LogFormat, LogLevel};
//!
//! init_logging(&LogConfig {
//!     level: LogLevel::Debug,
//!     format: LogFormat::Json,
//!     ..Default::default()
//! });
//!
//! tracing::info!(pulsars = 3, "Injecting background");
//! ```
//!
//! The filter comes from the configuration only; `RUST_LOG` is not read.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt as tfmt, prelude::*, EnvFilter, Layer, Registry};

/// Minimum severity of emitted events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-line, colored
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

/// Logging section of a run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Per-target directives (e.g. "pta_core=debug,pta_sim=trace"),
    /// overriding `level`
    pub filter: Option<String>,
    /// Include file:line of each event
    pub source_location: bool,
    pub thread_ids: bool,
    /// Log span enter/exit
    pub span_events: bool,
}

impl LogConfig {
    /// Compact output, errors only.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            ..Default::default()
        }
    }

    /// Filter directive handed to `EnvFilter`. Unparseable custom filters
    /// fall back to the plain level.
    pub fn directive(&self) -> String {
        match &self.filter {
            Some(custom) if EnvFilter::try_new(custom).is_ok() => custom.clone(),
            _ => self.level.to_string(),
        }
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    /// Formatting layer for the configured output style.
    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let base = tfmt::layer()
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_thread_ids(self.thread_ids)
            .with_span_events(self.span_events());
        match self.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Pretty => base.pretty().boxed(),
            LogFormat::Compact => base.compact().boxed(),
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// Returns `false` when a subscriber was already installed; the earlier one
/// stays in effect.
pub fn init_logging(config: &LogConfig) -> bool {
    tracing_subscriber::registry()
        .with(config.layer())
        .with(EnvFilter::new(config.directive()))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Warn.as_str(), "warn");
    }

    #[test]
    fn test_defaults_and_quiet() {
        let cfg = LogConfig::default();
        assert_eq!(cfg.level, LogLevel::Info);
        assert_eq!(cfg.format, LogFormat::Pretty);
        assert_eq!(cfg.span_events(), FmtSpan::NONE);
        let quiet = LogConfig::quiet();
        assert_eq!(quiet.level, LogLevel::Error);
        assert_eq!(quiet.directive(), "error");
    }

    #[test]
    fn test_directive() {
        let cfg = LogConfig {
            filter: Some("pta_core=trace".into()),
            ..Default::default()
        };
        assert_eq!(cfg.directive(), "pta_core=trace");
        let bad = LogConfig {
            filter: Some("pta_core=notalevel".into()),
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert_eq!(bad.directive(), "warn");
    }

    #[test]
    fn test_yaml_section() {
        let cfg: LogConfig = serde_yaml::from_str("format: json\nspan_events: true\n").unwrap();
        assert_eq!(cfg.format, LogFormat::Json);
        assert_eq!(cfg.level, LogLevel::Info);
        assert_eq!(cfg.span_events(), FmtSpan::NEW | FmtSpan::CLOSE);
    }

    #[test]
    fn test_second_init_is_ignored() {
        init_logging(&LogConfig::quiet());
        assert!(!init_logging(&LogConfig::quiet()));
    }
}
