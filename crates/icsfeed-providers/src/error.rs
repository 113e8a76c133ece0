//! Error types for calendar source operations.
//!
//! A [`SourceError`] describes a failure of the backing calendar service
//! itself (transport, credentials, unexpected payloads). "Entity not found"
//! is not an error at this level; sources report it as `Ok(None)`.

use std::fmt;
use thiserror::Error;

/// The category of a source error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorCode {
    /// The source rejected our credentials.
    AuthenticationFailed,
    /// Network error - connection failed, DNS resolution, etc.
    NetworkError,
    /// The source returned a 5xx status.
    ServerError,
    /// The payload could not be understood.
    InvalidResponse,
    /// Missing or invalid source configuration.
    ConfigurationError,
}

impl SourceErrorCode {
    /// Returns a machine-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for SourceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised by a calendar source.
#[derive(Debug, Error)]
pub struct SourceError {
    code: SourceErrorCode,
    message: String,
    /// The source that generated this error (e.g. "home_assistant").
    source_name: Option<String>,
    #[source]
    cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SourceError {
    /// Creates a new source error with the given code and message.
    pub fn new(code: SourceErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source_name: None,
            cause: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::NetworkError, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SourceErrorCode::ConfigurationError, message)
    }

    /// Sets the source name for this error.
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Attaches the underlying cause.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> SourceErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the source name, if set.
    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref name) = self.source_name {
            write!(f, "[{}] ", name)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_names() {
        assert_eq!(
            SourceErrorCode::AuthenticationFailed.as_str(),
            "authentication_failed"
        );
        assert_eq!(SourceErrorCode::InvalidResponse.to_string(), "invalid_response");
    }

    #[test]
    fn source_error_creation() {
        let err = SourceError::authentication("token rejected");
        assert_eq!(err.code(), SourceErrorCode::AuthenticationFailed);
        assert_eq!(err.message(), "token rejected");
        assert!(err.source_name().is_none());
    }

    #[test]
    fn source_error_display() {
        let err = SourceError::network("connection refused").with_source_name("home_assistant");
        let display = err.to_string();
        assert!(display.contains("[home_assistant]"));
        assert!(display.contains("network_error"));
        assert!(display.contains("connection refused"));
    }

    #[test]
    fn source_error_with_cause() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = SourceError::configuration("failed to read events").with_cause(io_err);
        assert!(err.source().is_some());
    }
}
