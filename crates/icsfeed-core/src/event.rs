//! Event records as returned by calendar sources.

use serde::{Deserialize, Serialize};

use crate::time::{EventTime, TimeParseError};

/// One calendar event inside the feed window.
///
/// `start` and `end` are kept as the strings the source delivered; they are
/// parsed only when the feed is serialized so a malformed value can be
/// reported together with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Start as a datetime with offset or a `YYYY-MM-DD` date.
    pub start: String,
    /// End as a datetime with offset or a `YYYY-MM-DD` date.
    pub end: String,
    /// The event title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the event takes place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl EventRecord {
    /// Creates a new event with the given start and end.
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            summary: None,
            description: None,
            location: None,
        }
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Parses the start time.
    pub fn start_time(&self) -> Result<EventTime, TimeParseError> {
        EventTime::parse(&self.start)
    }

    /// Parses the end time.
    pub fn end_time(&self) -> Result<EventTime, TimeParseError> {
        EventTime::parse(&self.end)
    }
}
