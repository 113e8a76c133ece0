//! Command-line interface definition.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use icsfeed_core::{TracingConfig, TracingOutputFormat};

/// icsfeed - Authenticated iCalendar feeds for calendar entities
#[derive(Debug, Parser)]
#[command(name = "icsfeed")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "ICSFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides the config file)
    #[arg(long, env = "ICSFEED_BIND")]
    pub bind: Option<SocketAddr>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long)]
    pub log_format: Option<TracingOutputFormat>,

    /// Log filter directive, e.g. `icsfeed=debug` (overrides RUST_LOG)
    #[arg(long, env = "ICSFEED_LOG")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve feeds (the default)
    Serve,

    /// Validate the configuration and exit
    CheckConfig,
}

impl Cli {
    /// Logging settings for this invocation.
    ///
    /// Serving without a terminal on stdout uses the JSON daemon preset.
    /// `--debug`, `--log-format` and `--log-filter` take precedence.
    pub fn tracing_config(&self, stdout_is_terminal: bool) -> TracingConfig {
        let serving = !matches!(self.command, Some(Command::CheckConfig));
        let mut config = if self.debug {
            TracingConfig::debug()
        } else if serving && !stdout_is_terminal {
            TracingConfig::daemon()
        } else {
            TracingConfig::default()
        };
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        if let Some(ref filter) = self.log_filter {
            config = config.with_env_filter(filter);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serving() {
        let cli = Cli::try_parse_from(["icsfeed"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.debug);
        assert!(cli.log_format.is_none());
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "icsfeed",
            "--config",
            "/etc/icsfeed.toml",
            "--bind",
            "0.0.0.0:9000",
            "-v",
            "--log-format",
            "json",
            "check-config",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/icsfeed.toml")));
        assert_eq!(cli.bind, Some("0.0.0.0:9000".parse().unwrap()));
        assert!(cli.debug);
        assert_eq!(cli.log_format, Some(TracingOutputFormat::Json));
        assert!(matches!(cli.command, Some(Command::CheckConfig)));
    }

    #[test]
    fn detached_server_logs_json() {
        let cli = Cli::try_parse_from(["icsfeed", "serve"]).unwrap();
        assert_eq!(cli.tracing_config(false).output_format, TracingOutputFormat::Json);
        assert_eq!(cli.tracing_config(true).output_format, TracingOutputFormat::Pretty);

        let cli = Cli::try_parse_from(["icsfeed", "check-config"]).unwrap();
        assert_eq!(cli.tracing_config(false).output_format, TracingOutputFormat::Pretty);
    }

    #[test]
    fn explicit_logging_flags_win() {
        let cli = Cli::try_parse_from(["icsfeed", "-v"]).unwrap();
        let config = cli.tracing_config(false);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert_eq!(config.default_level, tracing::Level::DEBUG);

        let cli = Cli::try_parse_from([
            "icsfeed",
            "--log-format",
            "compact",
            "--log-filter",
            "icsfeed=trace",
        ])
        .unwrap();
        let config = cli.tracing_config(false);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert_eq!(config.env_filter.as_deref(), Some("icsfeed=trace"));
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["icsfeed", "--log-format", "xml"]).is_err());
    }
}
