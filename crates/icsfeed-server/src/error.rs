//! Server error types.

use std::io;
use std::path::PathBuf;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use icsfeed_core::{AuthError, FeedError, TracingError};
use icsfeed_providers::{FetchError, SourceError};

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (listener, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for our schema.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration is well-formed but unusable.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A secret reference could not be resolved.
    #[error("failed to resolve secret {reference:?}: {message}")]
    Secret { reference: String, message: String },

    /// The calendar source could not be created.
    #[error("calendar source error: {0}")]
    Source(#[from] SourceError),

    /// Logging could not be initialized.
    #[error("tracing error: {0}")]
    Tracing(#[from] TracingError),
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a secret resolution error.
    ///
    /// Only the reference is kept (`env::VAR`, `file::path`); plain-text
    /// values never reach this error.
    pub fn secret(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Secret {
            reference: reference.into(),
            message: message.into(),
        }
    }
}

/// Why a single feed request failed.
///
/// Every variant maps to one HTTP status; the response body is a short
/// plaintext line such as `404: Not Found`.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The request was refused.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The calendar name or events could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// An event could not be serialized.
    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl RequestError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::Auth(e) => e.status(),
            Self::Fetch(e) => e.status(),
            Self::Feed(_) => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(e) => e.as_str(),
            Self::Fetch(e) => e.as_str(),
            Self::Feed(_) => "malformed_event",
        }
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = format!(
            "{}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error")
        );
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icsfeed_core::EventField;
    use std::time::Duration;

    #[test]
    fn request_error_status() {
        assert_eq!(
            RequestError::from(AuthError::MissingSecret).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            RequestError::from(AuthError::InvalidSecret).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            RequestError::from(FetchError::NoEventsOrUnavailable).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RequestError::from(FetchError::CalendarUnavailable).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            RequestError::from(FetchError::Timeout(Duration::from_secs(1))).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            RequestError::from(FetchError::Source(SourceError::network("down"))).status(),
            StatusCode::BAD_GATEWAY
        );
        let feed = FeedError::MalformedEvent {
            index: 0,
            field: EventField::Start,
            value: "soon".to_string(),
        };
        assert_eq!(
            RequestError::from(feed).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn request_error_kind() {
        assert_eq!(
            RequestError::from(AuthError::NotACalendar).kind(),
            "not_a_calendar"
        );
        assert_eq!(
            RequestError::from(FetchError::CalendarNotFound).kind(),
            "calendar_not_found"
        );
    }

    #[test]
    fn secret_error_shows_reference_only() {
        let err = ServerError::secret("env::FEED_SECRET", "environment variable is not set");
        assert_eq!(
            err.to_string(),
            "failed to resolve secret \"env::FEED_SECRET\": environment variable is not set"
        );
    }
}
