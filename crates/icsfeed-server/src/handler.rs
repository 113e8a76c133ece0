//! Feed request handling.
//!
//! [`FeedService`] runs one feed request end to end: authorize against the
//! registry, look up the calendar name, fetch the events of the feed window
//! and serialize them. Nothing is fetched for a refused request.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use icsfeed_core::{FeedInput, FeedOptions, Registry, authorize, serialize};
use icsfeed_providers::EventFetcher;

use crate::config::ServerConfig;
use crate::error::RequestError;

/// Shared state behind every feed request.
#[derive(Debug, Clone)]
pub struct FeedService {
    registry: Arc<Registry>,
    fetcher: EventFetcher,
    options: Arc<FeedOptions>,
}

impl FeedService {
    /// Creates a service from its parts.
    pub fn new(registry: Arc<Registry>, fetcher: EventFetcher, options: FeedOptions) -> Self {
        Self {
            registry,
            fetcher,
            options: Arc::new(options),
        }
    }

    /// Creates a service over `registry` and `fetcher` using the runtime
    /// settings of `config`.
    pub fn from_config(registry: Registry, fetcher: EventFetcher, config: &ServerConfig) -> Self {
        let fetcher = fetcher.with_empty_feeds(config.serve_empty_feeds);
        Self::new(Arc::new(registry), fetcher, config.feed_options())
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders the feed of `calendar_id` for a request carrying `secret`.
    pub async fn render(
        &self,
        calendar_id: &str,
        secret: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, RequestError> {
        let result = self.render_inner(calendar_id, secret, now).await;
        match &result {
            // Refusals are already logged by `authorize`.
            Err(RequestError::Auth(_)) => {}
            Err(err) => warn!(
                calendar_id,
                error.kind = err.kind(),
                status = err.status().as_u16(),
                "Feed request failed: {}",
                err
            ),
            Ok(body) => debug!(calendar_id, bytes = body.len(), "Feed rendered"),
        }
        result
    }

    async fn render_inner(
        &self,
        calendar_id: &str,
        secret: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, RequestError> {
        let calendar = authorize(&self.registry, calendar_id, secret)?;
        let display_name = self.fetcher.calendar_name(calendar_id).await?;
        let events = self.fetcher.fetch_events(calendar_id, now).await?;

        let feed = FeedInput::new(calendar_id, &display_name).with_color(calendar.color.as_deref());
        Ok(serialize(
            &feed,
            &events,
            self.registry.color_rules(),
            &self.options,
        )?)
    }
}
