//! HTTP server for authenticated calendar feeds.
//!
//! This crate provides the `icsfeed` daemon that handles:
//! - `GET /api/ics/{calendar_id}?s={secret}` feed requests
//! - TOML configuration with secret references
//! - Graceful shutdown on SIGTERM/SIGINT
//!
//! # Example
//!
//! ```rust,no_run
//! use icsfeed_server::{FeedService, FileConfig, HttpServer, SignalHandler};
//! use icsfeed_providers::EventFetcher;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = FileConfig::load(None)?;
//!     let config = file.server_config()?;
//!     let source = file.source.build(config.fetch_timeout)?;
//!     let fetcher = EventFetcher::new(source, config.fetch_timeout);
//!     let service = FeedService::from_config(file.registry()?, fetcher, &config);
//!
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!     HttpServer::bind(&config)
//!         .await?
//!         .run_until_shutdown(service, signals.shutdown().wait())
//!         .await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
mod config;
mod error;
mod handler;
mod routes;
pub mod secret;
mod server;
mod signals;

pub use config::{
    CalendarEntry, ColorEntry, DEFAULT_BIND, FileConfig, ServerConfig, ServerSettings,
    SourceSettings,
};
pub use error::{RequestError, ServerError, ServerResult};
pub use handler::FeedService;
pub use routes::{ICS_CONTENT_TYPE, router};
pub use server::HttpServer;
pub use signals::{ShutdownSignal, SignalHandler};
