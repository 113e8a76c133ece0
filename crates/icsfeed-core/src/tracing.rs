//! Tracing setup for icsfeed.
//!
//! One subscriber configuration shared by the server binary and tools.
//! Interactive runs use the pretty format; the daemon preset writes JSON so
//! feed requests can be shipped to a log collector.
//!
//! ```ignore
//! use icsfeed_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::daemon())?;
//! ```

use std::str::FromStr;

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*, registry::LookupSpan};

/// Crates whose events pass the default filter.
const LOGGED_TARGETS: [&str; 2] = ["icsfeed", "tower_http"];

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber is already installed
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// The filter directive does not parse
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),

    /// Unknown output format name
    #[error("unknown log format {0:?} (expected pretty, compact or json)")]
    UnknownFormat(String),
}

/// How log lines are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, human-readable output
    #[default]
    Pretty,
    /// One line per event
    Compact,
    /// One JSON object per event
    Json,
}

impl FromStr for TracingOutputFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(TracingError::UnknownFormat(other.to_string())),
        }
    }
}

/// Logging settings of a process.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the icsfeed crates and the HTTP layer when no filter is set
    pub default_level: Level,
    /// Rendering of log lines
    pub output_format: TracingOutputFormat,
    /// Include source file and line
    pub include_location: bool,
    /// Include the module path of the event
    pub include_target: bool,
    /// Explicit filter directive; takes precedence over `RUST_LOG`
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Pretty,
            include_location: false,
            include_target: true,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Verbose single-line output for local debugging
    #[must_use]
    pub fn debug() -> Self {
        Self {
            default_level: Level::DEBUG,
            output_format: TracingOutputFormat::Compact,
            include_location: true,
            ..Self::default()
        }
    }

    /// JSON output for running as a service
    #[must_use]
    pub fn daemon() -> Self {
        Self {
            output_format: TracingOutputFormat::Json,
            ..Self::default()
        }
    }

    /// The filter applied when neither `env_filter` nor `RUST_LOG` is set.
    ///
    /// Covers the icsfeed crates and the HTTP trace layer.
    pub fn default_directive(&self) -> String {
        LOGGED_TARGETS
            .iter()
            .map(|target| format!("{target}={}", self.default_level))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Set the output format
    #[must_use]
    pub fn with_format(mut self, format: TracingOutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Set an explicit filter directive
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    fn filter(&self) -> Result<EnvFilter, TracingError> {
        match self.env_filter {
            Some(ref directive) => Ok(EnvFilter::try_new(directive)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))),
        }
    }

    fn layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync + 'static>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let layer = fmt::layer()
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(self.include_target);

        match self.output_format {
            TracingOutputFormat::Pretty => layer.pretty().boxed(),
            TracingOutputFormat::Compact => layer.compact().boxed(),
            TracingOutputFormat::Json => layer.json().boxed(),
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Call once at process start. `RUST_LOG` overrides the default level
/// unless the config carries an explicit filter.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set or the filter
/// directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let subscriber = tracing_subscriber::registry()
        .with(config.filter()?)
        .with(config.layer());
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Pretty);
        assert!(!config.include_location);
        assert!(config.include_target);
        assert!(config.env_filter.is_none());
    }

    #[test]
    fn presets() {
        let debug = TracingConfig::debug();
        assert_eq!(debug.default_level, Level::DEBUG);
        assert_eq!(debug.output_format, TracingOutputFormat::Compact);
        assert!(debug.include_location);

        let daemon = TracingConfig::daemon();
        assert_eq!(daemon.default_level, Level::INFO);
        assert_eq!(daemon.output_format, TracingOutputFormat::Json);
    }

    #[test]
    fn default_directive_covers_http_layer() {
        let config = TracingConfig {
            default_level: Level::WARN,
            ..TracingConfig::default()
        };
        assert_eq!(config.default_directive(), "icsfeed=WARN,tower_http=WARN");
    }

    #[test]
    fn format_from_str() {
        assert_eq!(
            "json".parse::<TracingOutputFormat>().unwrap(),
            TracingOutputFormat::Json
        );
        assert_eq!(
            "Compact".parse::<TracingOutputFormat>().unwrap(),
            TracingOutputFormat::Compact
        );
        assert!(matches!(
            "xml".parse::<TracingOutputFormat>(),
            Err(TracingError::UnknownFormat(name)) if name == "xml"
        ));
    }

    #[test]
    fn explicit_filter_is_validated() {
        let config = TracingConfig::default().with_env_filter("icsfeed=verbose");
        assert!(matches!(config.filter(), Err(TracingError::EnvFilter(_))));

        let config = TracingConfig::default().with_env_filter("icsfeed=trace");
        assert!(config.filter().is_ok());
    }

    #[test]
    fn builder_methods() {
        let config = TracingConfig::debug()
            .with_format(TracingOutputFormat::Json)
            .with_env_filter("icsfeed=trace");

        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("icsfeed=trace"));
    }
}
