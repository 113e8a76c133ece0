//! Home Assistant source configuration.

use std::fmt;
use std::time::Duration;
use url::Url;

/// Configuration for the Home Assistant source.
#[derive(Clone)]
pub struct HomeAssistantConfig {
    /// Base URL of the Home Assistant instance.
    pub url: Url,

    /// Long-lived access token.
    pub token: String,

    /// Whether to verify TLS certificates.
    pub verify_tls: bool,

    /// Request timeout.
    pub timeout: Duration,

    /// User agent string.
    pub user_agent: String,
}

impl HomeAssistantConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration for the instance at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(url: impl AsRef<str>, token: impl Into<String>) -> Result<Self, url::ParseError> {
        let mut parsed = Url::parse(url.as_ref())?;
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }
        Ok(Self {
            url: parsed,
            token: token.into(),
            verify_tls: true,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("icsfeed/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    /// Disables TLS verification (self-signed local instances).
    pub fn with_insecure_tls(mut self) -> Self {
        self.verify_tls = false;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the URL of an API endpoint below the base URL.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, url::ParseError> {
        let path = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        self.url.join(&path)
    }
}

impl fmt::Debug for HomeAssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeAssistantConfig")
            .field("url", &self.url.as_str())
            .field("token", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
