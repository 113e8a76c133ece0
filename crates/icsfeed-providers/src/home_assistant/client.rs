//! HTTP client for the Home Assistant REST API.

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{trace, warn};
use url::Url;

use crate::error::{SourceError, SourceResult};

use super::config::HomeAssistantConfig;

/// Authenticated client for the Home Assistant REST API.
pub struct HomeAssistantClient {
    client: Client,
    config: HomeAssistantConfig,
}

impl HomeAssistantClient {
    /// Creates a client with the given configuration.
    pub fn new(config: HomeAssistantConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SourceError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Builds the URL of an API endpoint.
    pub fn endpoint(&self, segments: &[&str]) -> SourceResult<Url> {
        self.config
            .endpoint(segments)
            .map_err(|e| SourceError::configuration(format!("Invalid endpoint URL: {}", e)))
    }

    /// GETs `url` and decodes the JSON body.
    ///
    /// Returns `Ok(None)` on 404.
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SourceResult<Option<T>> {
        trace!(url = %url.path(), "GET");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| SourceError::network(format!("Request failed: {}", e)).with_cause(e))?;

        let Some(body) = self.handle_response(response).await? else {
            return Ok(None);
        };
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| SourceError::invalid_response(format!("Invalid JSON: {}", e)))
    }

    async fn handle_response(&self, response: Response) -> SourceResult<Option<String>> {
        let status = response.status();
        trace!(status = %status, "Received response");

        match status {
            StatusCode::OK => response
                .text()
                .await
                .map(Some)
                .map_err(|e| SourceError::network(format!("Failed to read response: {}", e))),
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SourceError::authentication(
                "Authentication failed: access token rejected",
            )),
            s if s.is_server_error() => {
                let body = response.text().await.unwrap_or_default();
                Err(SourceError::server(format!("Server error ({}): {}", s, body)))
            }
            s => {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %s, body = %body, "Unexpected response status");
                Err(SourceError::invalid_response(format!(
                    "Unexpected status {}: {}",
                    s, body
                )))
            }
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &HomeAssistantConfig {
        &self.config
    }
}
