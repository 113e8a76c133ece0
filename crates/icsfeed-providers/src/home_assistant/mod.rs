//! Home Assistant calendar source.
//!
//! [`HomeAssistantSource`] reads calendar entities through the Home Assistant
//! REST API using a long-lived access token:
//!
//! - `GET /api/states/{entity_id}` for the entity state and friendly name
//! - `GET /api/calendars/{entity_id}?start=..&end=..` for events
//!
//! # Example
//!
//! ```ignore
//! use icsfeed_providers::home_assistant::{HomeAssistantConfig, HomeAssistantSource};
//!
//! let config = HomeAssistantConfig::new("http://homeassistant.local:8123", token)?;
//! let source = HomeAssistantSource::new(config)?;
//! let state = source.calendar_state("calendar.family").await?;
//! ```

mod client;
mod config;

pub use client::HomeAssistantClient;
pub use config::HomeAssistantConfig;

use chrono::SecondsFormat;
use serde::Deserialize;
use tracing::debug;

use icsfeed_core::{EventRecord, TimeWindow};

use crate::error::SourceResult;
use crate::source::{BoxFuture, CalendarEvents, CalendarSource, CalendarState, EventsResponse};

const SOURCE_NAME: &str = "home_assistant";

/// Entity states that mean the calendar cannot be served.
const UNAVAILABLE_STATES: [&str; 2] = ["unavailable", "unknown"];

#[derive(Debug, Deserialize)]
struct EntityState {
    state: String,
    #[serde(default)]
    attributes: EntityAttributes,
}

#[derive(Debug, Default, Deserialize)]
struct EntityAttributes {
    friendly_name: Option<String>,
}

impl From<EntityState> for CalendarState {
    fn from(entity: EntityState) -> Self {
        if UNAVAILABLE_STATES.contains(&entity.state.as_str()) {
            return CalendarState::unavailable();
        }
        CalendarState {
            name: entity.attributes.friendly_name,
            available: true,
        }
    }
}

/// Start or end of an event in the calendar API.
#[derive(Debug, Deserialize)]
struct ApiEventTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
}

impl ApiEventTime {
    fn into_value(self) -> String {
        self.date_time.or(self.date).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    start: ApiEventTime,
    end: ApiEventTime,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
}

impl From<ApiEvent> for EventRecord {
    fn from(event: ApiEvent) -> Self {
        EventRecord {
            start: event.start.into_value(),
            end: event.end.into_value(),
            summary: event.summary,
            description: event.description,
            location: event.location,
        }
    }
}

/// Calendar source backed by a Home Assistant instance.
pub struct HomeAssistantSource {
    client: HomeAssistantClient,
}

impl HomeAssistantSource {
    /// Creates a source with the given configuration.
    pub fn new(config: HomeAssistantConfig) -> SourceResult<Self> {
        let client =
            HomeAssistantClient::new(config).map_err(|e| e.with_source_name(SOURCE_NAME))?;
        Ok(Self { client })
    }

    async fn fetch_state(&self, calendar_id: &str) -> SourceResult<Option<CalendarState>> {
        let url = self.client.endpoint(&["api", "states", calendar_id])?;
        let entity: Option<EntityState> = self.client.get_json(url).await?;
        Ok(entity.map(CalendarState::from))
    }

    async fn fetch_events(
        &self,
        calendar_id: &str,
        window: &TimeWindow,
    ) -> SourceResult<Option<EventsResponse>> {
        let mut url = self.client.endpoint(&["api", "calendars", calendar_id])?;
        url.query_pairs_mut()
            .append_pair(
                "start",
                &window.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .append_pair("end", &window.end.to_rfc3339_opts(SecondsFormat::Secs, true));

        let Some(events) = self.client.get_json::<Vec<ApiEvent>>(url).await? else {
            return Ok(None);
        };
        debug!(calendar_id, count = events.len(), "Received calendar events");

        let events = events.into_iter().map(EventRecord::from).collect();
        let mut response = EventsResponse::new();
        response.insert(calendar_id.to_string(), CalendarEvents::new(events));
        Ok(Some(response))
    }
}

impl CalendarSource for HomeAssistantSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn calendar_state<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, SourceResult<Option<CalendarState>>> {
        Box::pin(async move {
            self.fetch_state(calendar_id)
                .await
                .map_err(|e| e.with_source_name(SOURCE_NAME))
        })
    }

    fn get_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, SourceResult<Option<EventsResponse>>> {
        Box::pin(async move {
            self.fetch_events(calendar_id, window)
                .await
                .map_err(|e| e.with_source_name(SOURCE_NAME))
        })
    }
}
