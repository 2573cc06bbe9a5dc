//! Tracing subscriber setup for test hosts.
//!
//! The engine itself only emits `tracing` events. Hosts that want to see them
//! call [`init_logging`] once, typically from a test helper:
//!
//! ```ignore
//! callshim_core::logging::init_logging(&LogConfig::from_env().for_tests())?;
//! ```

use crate::error::{CallshimError, Result};
use std::env;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for structured logging.
    Json,
    /// Human-readable multi-line format.
    Pretty,
    /// Compact single-line format.
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::default(),
        })
    }
}

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    format: LogFormat,
    filter: String,
    test_writer: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: "info".to_string(),
            test_writer: false,
        }
    }
}

impl LogConfig {
    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CALLSHIM_LOG_FORMAT`: "json", "pretty", or "compact"
    /// - `CALLSHIM_LOG_LEVEL` or `RUST_LOG`: log filter string
    pub fn from_env() -> Self {
        let format = env::var("CALLSHIM_LOG_FORMAT").ok();
        let level = env::var("CALLSHIM_LOG_LEVEL").ok();
        let rust_log = env::var("RUST_LOG").ok();
        Self::from_values(format.as_deref(), level.as_deref(), rust_log.as_deref())
    }

    /// Build a configuration from raw setting strings.
    ///
    /// `level` takes precedence over `rust_log`; with neither the filter is
    /// `"info"`.
    pub fn from_values(
        format: Option<&str>,
        level: Option<&str>,
        rust_log: Option<&str>,
    ) -> Self {
        let format = format
            .and_then(|s| s.parse::<LogFormat>().ok())
            .unwrap_or_default();
        let filter = level.or(rust_log).unwrap_or("info").to_string();

        Self {
            format,
            filter,
            test_writer: false,
        }
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set the filter directive (e.g., "debug,callshim_core=trace").
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Route output through the test harness so it is captured per test.
    #[must_use]
    pub fn for_tests(mut self) -> Self {
        self.test_writer = true;
        self
    }

    /// The output format.
    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// The filter directive.
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

/// Install a global tracing subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, so every test
/// in a binary may call this. An unparsable filter is an `InvalidConfig`
/// error.
pub fn init_logging(config: &LogConfig) -> Result<bool> {
    let filter =
        EnvFilter::try_new(config.filter()).map_err(|e| CallshimError::InvalidConfig {
            field: "filter".to_string(),
            cause: e.to_string(),
        })?;

    let installed = match (config.format(), config.test_writer) {
        (LogFormat::Json, true) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true).with_test_writer())
            .try_init(),
        (LogFormat::Json, false) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().flatten_event(true))
            .try_init(),
        (LogFormat::Pretty, true) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_test_writer())
            .try_init(),
        (LogFormat::Pretty, false) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .try_init(),
        (LogFormat::Compact, true) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact().with_test_writer())
            .try_init(),
        (LogFormat::Compact, false) => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init(),
    };

    Ok(installed.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("other".parse::<LogFormat>().unwrap(), LogFormat::Compact);
    }

    #[test]
    fn builder_methods() {
        let config = LogConfig::default()
            .with_format(LogFormat::Json)
            .with_filter("debug")
            .for_tests();
        assert_eq!(config.format(), LogFormat::Json);
        assert_eq!(config.filter(), "debug");
        assert!(config.test_writer);
    }

    #[test]
    fn level_falls_back_to_rust_log_then_info() {
        let config = LogConfig::from_values(Some("json"), Some("debug"), Some("warn"));
        assert_eq!(config.format(), LogFormat::Json);
        assert_eq!(config.filter(), "debug");

        let config = LogConfig::from_values(None, None, Some("warn"));
        assert_eq!(config.format(), LogFormat::Compact);
        assert_eq!(config.filter(), "warn");

        let config = LogConfig::from_values(Some("fancy"), None, None);
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let config = LogConfig::default().with_filter("callshim_core=loud").for_tests();
        let err = init_logging(&config).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn repeated_init_is_harmless() {
        let config = LogConfig::default().for_tests();
        let _ = init_logging(&config).unwrap();
        assert!(!init_logging(&config).unwrap());
    }
}
