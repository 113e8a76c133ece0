//! Server configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/icsfeed/config.toml` by default:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8123"
//! fetch_timeout_secs = 30
//!
//! [source]
//! type = "home_assistant"
//! url = "http://homeassistant.local:8123"
//! token = "env::HASS_TOKEN"
//!
//! [[calendars]]
//! entity_id = "calendar.family"
//! secret = "env::FAMILY_FEED_SECRET"
//! color = "#3366ff"
//!
//! [[colors]]
//! name = "Dentist"
//! colour = "red"
//! ```
//!
//! Feed secrets and the source token support secret references
//! (`env::VAR`, `file::path`); see [`crate::secret`].

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use icsfeed_core::{CalendarConfig, ColorRule, DEFAULT_ORGANIZER_DOMAIN, FeedOptions, Registry};
use icsfeed_providers::home_assistant::{HomeAssistantConfig, HomeAssistantSource};
use icsfeed_providers::{CalendarSource, EventFetcher, StaticSource};

use crate::error::{ServerError, ServerResult};
use crate::secret;

/// Default listen address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8123";

// ---------------------------------------------------------------------------
// ServerConfig (runtime)
// ---------------------------------------------------------------------------

/// Runtime settings of the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,

    /// Bound on every calendar source call.
    pub fetch_timeout: Duration,

    /// Serve a header-only feed instead of 404 when a calendar has no events.
    pub serve_empty_feeds: bool,

    /// Domain of the organizer address written into every feed.
    pub organizer_domain: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8123)),
            fetch_timeout: EventFetcher::DEFAULT_TIMEOUT,
            serve_empty_feeds: false,
            organizer_domain: DEFAULT_ORGANIZER_DOMAIN.to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration listening on `bind`.
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Default::default()
        }
    }

    /// Builder: set the source call timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder: serve empty feeds.
    pub fn with_serve_empty_feeds(mut self, serve: bool) -> Self {
        self.serve_empty_feeds = serve;
        self
    }

    /// Builder: set the organizer domain.
    pub fn with_organizer_domain(mut self, domain: impl Into<String>) -> Self {
        self.organizer_domain = domain.into();
        self
    }

    /// Serialization options derived from this configuration.
    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions::default().with_organizer_domain(self.organizer_domain.clone())
    }
}

// ---------------------------------------------------------------------------
// FileConfig (config.toml)
// ---------------------------------------------------------------------------

/// Contents of `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerSettings,

    /// The calendar source.
    pub source: SourceSettings,

    /// Calendars that may be served.
    #[serde(default)]
    pub calendars: Vec<CalendarEntry>,

    /// Event colors by summary.
    #[serde(default)]
    pub colors: Vec<ColorEntry>,
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Address to listen on.
    pub bind: String,

    /// Source call timeout in seconds.
    pub fetch_timeout_secs: u64,

    /// Serve empty feeds instead of 404.
    pub serve_empty_feeds: bool,

    /// Domain of the organizer address.
    pub organizer_domain: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            fetch_timeout_secs: EventFetcher::DEFAULT_TIMEOUT.as_secs(),
            serve_empty_feeds: false,
            organizer_domain: DEFAULT_ORGANIZER_DOMAIN.to_string(),
        }
    }
}

/// `[source]` section.
#[derive(Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceSettings {
    /// A Home Assistant instance reached over its REST API.
    HomeAssistant {
        /// Base URL of the instance.
        url: String,
        /// Long-lived access token (secret reference allowed).
        token: String,
        /// Whether to verify TLS certificates.
        #[serde(default = "default_true")]
        verify_tls: bool,
    },
    /// Calendars loaded from a JSON file.
    Static {
        /// Path to the JSON file, relative to the config file.
        path: PathBuf,
    },
}

fn default_true() -> bool {
    true
}

impl fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HomeAssistant {
                url, verify_tls, ..
            } => f
                .debug_struct("HomeAssistant")
                .field("url", url)
                .field("token", &"<redacted>")
                .field("verify_tls", verify_tls)
                .finish(),
            Self::Static { path } => f.debug_struct("Static").field("path", path).finish(),
        }
    }
}

impl SourceSettings {
    /// Creates the configured calendar source.
    ///
    /// `timeout` also bounds the HTTP client of network sources.
    pub fn build(&self, timeout: Duration) -> ServerResult<Arc<dyn CalendarSource>> {
        match self {
            Self::HomeAssistant {
                url,
                token,
                verify_tls,
            } => {
                let token = secret::resolve(token)?;
                let mut config = HomeAssistantConfig::new(url, token)
                    .map_err(|e| ServerError::config(format!("invalid source url {:?}: {}", url, e)))?
                    .with_timeout(timeout);
                if !verify_tls {
                    config = config.with_insecure_tls();
                }
                Ok(Arc::new(HomeAssistantSource::new(config)?))
            }
            Self::Static { path } => {
                let source = StaticSource::from_json_file(path)?;
                if source.is_empty() {
                    warn!(path = %path.display(), "Static source holds no calendars");
                }
                Ok(Arc::new(source))
            }
        }
    }

    /// Short name of the source type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HomeAssistant { .. } => "home_assistant",
            Self::Static { .. } => "static",
        }
    }
}

/// A `[[calendars]]` entry.
#[derive(Clone, Deserialize)]
pub struct CalendarEntry {
    /// Calendar entity identifier, e.g. `calendar.family`.
    pub entity_id: String,
    /// Feed secret (secret reference allowed).
    pub secret: String,
    /// Optional calendar color.
    #[serde(default)]
    pub color: Option<String>,
}

impl fmt::Debug for CalendarEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarEntry")
            .field("entity_id", &self.entity_id)
            .field("secret", &"<redacted>")
            .field("color", &self.color)
            .finish()
    }
}

/// A `[[colors]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ColorEntry {
    /// Event summary to match.
    pub name: String,
    /// Color applied to matching events.
    #[serde(alias = "color")]
    pub colour: String,
}

impl FileConfig {
    /// Loads configuration from `path`, or from the default path.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_from(&Self::default_path()),
        }
    }

    /// Loads configuration from a specific path.
    ///
    /// A relative static source path is resolved against the directory of
    /// the config file.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content)?;

        if let SourceSettings::Static { path: data } = &mut config.source
            && data.is_relative()
            && let Some(dir) = path.parent()
        {
            *data = dir.join(&*data);
        }

        debug!(path = %path.display(), calendars = config.calendars.len(), "Loaded config");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> ServerResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("icsfeed")
    }

    /// Validates the `[server]` section into runtime settings.
    pub fn server_config(&self) -> ServerResult<ServerConfig> {
        let bind: SocketAddr = self.server.bind.parse().map_err(|e| {
            ServerError::config(format!("invalid bind address {:?}: {}", self.server.bind, e))
        })?;
        if self.server.fetch_timeout_secs == 0 {
            return Err(ServerError::config("fetch_timeout_secs must be positive"));
        }
        if self.server.organizer_domain.is_empty() {
            return Err(ServerError::config("organizer_domain must not be empty"));
        }

        Ok(ServerConfig::new(bind)
            .with_fetch_timeout(Duration::from_secs(self.server.fetch_timeout_secs))
            .with_serve_empty_feeds(self.server.serve_empty_feeds)
            .with_organizer_domain(&self.server.organizer_domain))
    }

    /// Builds the calendar registry, resolving every feed secret.
    pub fn registry(&self) -> ServerResult<Registry> {
        let calendars = self
            .calendars
            .iter()
            .map(|entry| {
                let secret = secret::resolve(&entry.secret)?;
                let calendar = CalendarConfig::new(&entry.entity_id, secret);
                Ok(match &entry.color {
                    Some(color) => calendar.with_color(color),
                    None => calendar,
                })
            })
            .collect::<ServerResult<Vec<_>>>()?;

        let color_rules = self
            .colors
            .iter()
            .map(|entry| ColorRule::new(&entry.name, &entry.colour))
            .collect();

        Ok(Registry::new(calendars, color_rules))
    }
}
