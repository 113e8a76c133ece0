//! Feed request authorization.
//!
//! [`authorize`] validates the requested calendar and the supplied secret
//! against the [`Registry`] before any event data is fetched.

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use crate::registry::{CalendarConfig, Registry};

/// Reasons a feed request is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum AuthError {
    /// The request carried no secret parameter.
    #[error("no secret supplied")]
    MissingSecret,
    /// The calendar is not configured (or has no secret).
    #[error("calendar is not configured")]
    UnknownCalendar,
    /// The secret does not match the configured one.
    #[error("invalid secret")]
    InvalidSecret,
    /// The identifier does not name a calendar entity.
    #[error("entity is not a calendar")]
    NotACalendar,
}

impl AuthError {
    /// Returns the HTTP status code for this refusal.
    ///
    /// Only a wrong secret yields 401; everything else is 403.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidSecret => 401,
            Self::MissingSecret | Self::UnknownCalendar | Self::NotACalendar => 403,
        }
    }

    /// Returns a machine-readable name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSecret => "missing_secret",
            Self::UnknownCalendar => "unknown_calendar",
            Self::InvalidSecret => "invalid_secret",
            Self::NotACalendar => "not_a_calendar",
        }
    }
}

/// Checks a feed request against the registry.
///
/// The checks run in a fixed order: secret presence, calendar configured,
/// secret match, calendar prefix. The first failing check decides the error.
/// Failures are logged with the calendar id; the secret is never logged.
pub fn authorize<'a>(
    registry: &'a Registry,
    calendar_id: &str,
    secret: Option<&str>,
) -> Result<&'a CalendarConfig, AuthError> {
    let result = check(registry, calendar_id, secret);
    if let Err(err) = result {
        warn!(calendar_id, error.kind = err.as_str(), "Feed request refused: {}", err);
    }
    result
}

fn check<'a>(
    registry: &'a Registry,
    calendar_id: &str,
    secret: Option<&str>,
) -> Result<&'a CalendarConfig, AuthError> {
    let Some(secret) = secret else {
        return Err(AuthError::MissingSecret);
    };

    let calendar = registry
        .get(calendar_id)
        .ok_or(AuthError::UnknownCalendar)?;

    if !secrets_match(secret, &calendar.secret) {
        return Err(AuthError::InvalidSecret);
    }

    if !calendar.is_calendar() {
        return Err(AuthError::NotACalendar);
    }

    Ok(calendar)
}

/// Compares two secrets without leaking where they differ.
///
/// Both sides are hashed first so the comparison always runs over 32 bytes
/// regardless of the input lengths.
fn secrets_match(supplied: &str, expected: &str) -> bool {
    let supplied = Sha256::digest(supplied.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    supplied
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
