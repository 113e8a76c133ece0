//! CalendarSource trait definition.
//!
//! A [`CalendarSource`] is the external calendar service the feed is built
//! from. It answers two questions about a calendar entity: what is it called
//! (and is it available), and which events fall inside a time window.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use icsfeed_core::{EventRecord, TimeWindow};

use crate::error::SourceResult;

/// State of a calendar entity as reported by its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarState {
    /// Human-readable name, if the entity has one.
    pub name: Option<String>,
    /// False when the entity exists but is unavailable or unknown.
    pub available: bool,
}

impl CalendarState {
    /// An available calendar with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            available: true,
        }
    }

    /// An entity that exists but is currently unavailable.
    pub fn unavailable() -> Self {
        Self {
            name: None,
            available: false,
        }
    }
}

/// The events of one calendar inside an events response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvents {
    /// Events in the order the source returned them.
    pub events: Vec<EventRecord>,
}

impl CalendarEvents {
    /// Wraps a list of events.
    pub fn new(events: Vec<EventRecord>) -> Self {
        Self { events }
    }
}

/// Events keyed by calendar identifier, as returned by an events query.
pub type EventsResponse = HashMap<String, CalendarEvents>;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the trait object-safe so sources can be shared as
/// `Arc<dyn CalendarSource>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The calendar service consumed by the feed.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; one instance serves all requests
/// - An entity the source does not know is `Ok(None)`, not an error
/// - Sources must not retry; the caller applies a timeout
pub trait CalendarSource: Send + Sync {
    /// Returns the name/type of this source (e.g., "home_assistant").
    fn name(&self) -> &str;

    /// Looks up the state of a calendar entity.
    ///
    /// Returns `Ok(None)` if no such entity exists.
    fn calendar_state<'a>(
        &'a self,
        calendar_id: &'a str,
    ) -> BoxFuture<'a, SourceResult<Option<CalendarState>>>;

    /// Fetches the events of a calendar inside `window`.
    ///
    /// Returns `Ok(None)` when the service produced no response for the
    /// calendar at all.
    fn get_events<'a>(
        &'a self,
        calendar_id: &'a str,
        window: &'a TimeWindow,
    ) -> BoxFuture<'a, SourceResult<Option<EventsResponse>>>;
}
