//! In-memory calendar source.
//!
//! [`StaticSource`] serves calendars held in memory, optionally loaded from a
//! JSON file of the form
//!
//! ```json
//! {
//!   "calendar.family": {
//!     "name": "Family",
//!     "events": [
//!       { "start": "2024-03-01T10:00:00+00:00", "end": "2024-03-01T11:00:00+00:00", "summary": "Dentist" }
//!     ]
//!   }
//! }
//! ```
//!
//! Events are filtered to the query window like a live service would.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use icsfeed_core::{EventRecord, TimeWindow};

use crate::error::{SourceError, SourceResult};
use crate::source::{BoxFuture, CalendarEvents, CalendarSource, CalendarState, EventsResponse};

fn default_available() -> bool {
    true
}

/// One calendar served by a [`StaticSource`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticCalendar {
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Whether the calendar reports as available.
    #[serde(default = "default_available")]
    pub available: bool,
    /// All events of the calendar, in the order they are served.
    #[serde(default)]
    pub events: Vec<EventRecord>,
}

impl StaticCalendar {
    /// Creates an available calendar with the given name and events.
    pub fn new(name: impl Into<String>, events: Vec<EventRecord>) -> Self {
        Self {
            name: Some(name.into()),
            available: true,
            events,
        }
    }

    /// Events overlapping `window`.
    ///
    /// Events whose times cannot be parsed are kept so the serializer can
    /// report them.
    fn events_in(&self, window: &TimeWindow) -> Vec<EventRecord> {
        self.events
            .iter()
            .filter(|event| match (event.start_time(), event.end_time()) {
                (Ok(start), Ok(end)) => {
                    window.overlaps(start.to_utc_datetime(), end.to_utc_datetime())
                }
                _ => true,
            })
            .cloned()
            .collect()
    }
}

/// A calendar source backed by fixed data.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    calendars: HashMap<String, StaticCalendar>,
}

impl StaticSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a calendar.
    pub fn with_calendar(mut self, calendar_id: impl Into<String>, calendar: StaticCalendar) -> Self {
        self.calendars.insert(calendar_id.into(), calendar);
        self
    }

    /// Parses calendars from JSON.
    pub fn from_json_str(json: &str) -> SourceResult<Self> {
        let calendars: HashMap<String, StaticCalendar> = serde_json::from_str(json).map_err(|e| {
            SourceError::configuration(format!("invalid static calendar data: {}", e))
                .with_source_name("static")
        })?;
        Ok(Self { calendars })
    }

    /// Loads calendars from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SourceError::configuration(format!("failed to read {}", path.display()))
                .with_source_name("static")
                .with_cause(e)
        })?;
        let source = Self::from_json_str(&json)?;
        debug!(path = %path.display(), calendars = source.calendars.len(), "Loaded static calendars");
        Ok(source)
    }

    /// Returns the number of calendars.
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    /// Returns true if the source holds no calendars.
    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}

impl CalendarSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    fn calendar_state<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, SourceResult<Option<CalendarState>>> {
        let state = self.calendars.get(calendar_id).map(|calendar| CalendarState {
            name: calendar.name.clone(),
            available: calendar.available,
        });
        Box::pin(async move { Ok(state) })
    }

    fn get_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, SourceResult<Option<EventsResponse>>> {
        let response = self.calendars.get(calendar_id).map(|calendar| {
            let mut response = EventsResponse::new();
            response.insert(
                calendar_id.to_string(),
                CalendarEvents::new(calendar.events_in(window)),
            );
            response
        });
        Box::pin(async move { Ok(response) })
    }
}
