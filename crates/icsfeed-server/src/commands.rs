//! Entry points of the `icsfeed` binary.

use tracing::{info, warn};

use icsfeed_core::Registry;
use icsfeed_providers::EventFetcher;

use crate::cli::Cli;
use crate::config::{FileConfig, ServerConfig};
use crate::error::ServerResult;
use crate::handler::FeedService;
use crate::server::HttpServer;
use crate::signals::SignalHandler;

/// Loads and validates everything a running server needs.
fn prepare(cli: &Cli) -> ServerResult<(FileConfig, ServerConfig, Registry)> {
    let file = FileConfig::load(cli.config.as_deref())?;
    let mut server = file.server_config()?;
    if let Some(bind) = cli.bind {
        server.bind = bind;
    }
    let registry = file.registry()?;
    Ok((file, server, registry))
}

/// Serves feeds until SIGTERM/SIGINT.
pub async fn serve(cli: &Cli) -> ServerResult<()> {
    let (file, config, registry) = prepare(cli)?;
    let source = file.source.build(config.fetch_timeout)?;
    let fetcher = EventFetcher::new(source, config.fetch_timeout);

    info!(
        source = fetcher.source_name(),
        timeout_secs = fetcher.timeout().as_secs(),
        calendars = registry.len(),
        "Starting feed server"
    );
    if registry.is_empty() {
        warn!("No calendars configured, every feed request will be refused");
    }

    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener();

    let service = FeedService::from_config(registry, fetcher, &config);
    let server = HttpServer::bind(&config).await?;
    server
        .run_until_shutdown(service, signal_handler.shutdown().wait())
        .await
}

/// Validates the configuration and prints a summary.
pub fn check_config(cli: &Cli) -> ServerResult<()> {
    let (file, config, registry) = prepare(cli)?;
    file.source.build(config.fetch_timeout)?;

    println!("source: {}", file.source.kind());
    println!("bind: {}", config.bind);
    for calendar_id in registry.calendar_ids() {
        println!("calendar: {}", calendar_id);
    }
    println!("color rules: {}", registry.color_rules().len());
    println!("Configuration is valid.");
    Ok(())
}
