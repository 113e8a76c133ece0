//! Core types: registry, authorization, events, iCalendar serialization

pub mod auth;
pub mod event;
pub mod ics;
pub mod registry;
pub mod time;
pub mod tracing;

pub use auth::{AuthError, authorize};
pub use event::EventRecord;
pub use ics::{
    DEFAULT_ORGANIZER_DOMAIN, EventField, FeedError, FeedInput, FeedOptions, PRODUCT_ID,
    event_uid, serialize,
};
pub use registry::{CALENDAR_PREFIX, CalendarConfig, ColorRule, Registry};
pub use time::{EventTime, LOOKAHEAD_WEEKS, LOOKBACK_WEEKS, TimeParseError, TimeWindow};
pub use crate::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
