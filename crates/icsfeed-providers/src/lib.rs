//! Calendar sources for the feed server.
//!
//! This crate provides the abstraction layer between the feed and the
//! calendar service it publishes:
//!
//! - [`CalendarSource`] - The trait every calendar backend implements
//! - [`EventFetcher`] - Name lookup and windowed event fetch with a timeout
//! - [`SourceError`] / [`FetchError`] - Error types for source operations
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐    ┌─────────────────┐
//! │  Home Assistant  │    │   JSON file     │
//! └────────┬─────────┘    └────────┬────────┘
//!          │                       │
//!          ▼                       ▼
//! ┌──────────────────┐    ┌─────────────────┐
//! │HomeAssistantSrc. │    │  StaticSource   │
//! └────────┬─────────┘    └────────┬────────┘
//!          │    CalendarSource     │
//!          └───────────┬───────────┘
//!                      ▼
//!               ┌──────────────┐
//!               │ EventFetcher │
//!               └──────┬───────┘
//!                      ▼
//!               Vec<EventRecord>
//! ```

pub mod error;
pub mod fetch;
#[cfg(feature = "home-assistant")]
pub mod home_assistant;
pub mod source;
pub mod static_source;

pub use error::{SourceError, SourceErrorCode, SourceResult};
pub use fetch::{EventFetcher, FetchError};
pub use source::{BoxFuture, CalendarEvents, CalendarSource, CalendarState, EventsResponse};
pub use static_source::{StaticCalendar, StaticSource};
