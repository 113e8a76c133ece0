//! Event fetching on top of a [`CalendarSource`].
//!
//! [`EventFetcher`] turns the raw answers of a source into the two facts a
//! feed needs: the calendar's display name and its events inside the feed
//! window. Every source call is bounded by a timeout and never retried.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use icsfeed_core::{EventRecord, TimeWindow};

use crate::error::{SourceError, SourceResult};
use crate::source::CalendarSource;

/// Why a calendar's name or events could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The source does not know the entity, or it has no display name.
    #[error("calendar not found")]
    CalendarNotFound,
    /// The entity exists but reports itself as unavailable.
    #[error("calendar is unavailable")]
    CalendarUnavailable,
    /// The source returned no events for the calendar.
    #[error("no events found or calendar unavailable")]
    NoEventsOrUnavailable,
    /// The source did not answer in time.
    #[error("calendar source timed out after {0:?}")]
    Timeout(Duration),
    /// The source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

impl FetchError {
    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::CalendarNotFound | Self::NoEventsOrUnavailable => 404,
            Self::CalendarUnavailable => 503,
            Self::Timeout(_) => 504,
            Self::Source(_) => 502,
        }
    }

    /// Machine-readable kind, used as a log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CalendarNotFound => "calendar_not_found",
            Self::CalendarUnavailable => "calendar_unavailable",
            Self::NoEventsOrUnavailable => "no_events_or_unavailable",
            Self::Timeout(_) => "source_timeout",
            Self::Source(_) => "source_error",
        }
    }
}

/// Fetches calendar names and events from a shared source.
#[derive(Clone)]
pub struct EventFetcher {
    source: Arc<dyn CalendarSource>,
    timeout: Duration,
    allow_empty: bool,
}

impl EventFetcher {
    /// Default bound on a single source call.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a fetcher over `source` with the given per-call timeout.
    pub fn new(source: Arc<dyn CalendarSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            allow_empty: false,
        }
    }

    /// When enabled, a calendar with zero events in the window yields an
    /// empty list instead of [`FetchError::NoEventsOrUnavailable`].
    pub fn with_empty_feeds(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    /// Returns the per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the name of the underlying source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Looks up the display name of a calendar entity.
    pub async fn calendar_name(&self, calendar_id: &str) -> Result<String, FetchError> {
        let state = self
            .bounded(self.source.calendar_state(calendar_id))
            .await?
            .ok_or(FetchError::CalendarNotFound)?;

        if !state.available {
            warn!(calendar_id, "Calendar entity is unavailable");
            return Err(FetchError::CalendarUnavailable);
        }

        state
            .name
            .filter(|name| !name.is_empty())
            .ok_or(FetchError::CalendarNotFound)
    }

    /// Fetches the events of a calendar for the feed window around `now`.
    pub async fn fetch_events(
        &self,
        calendar_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<EventRecord>, FetchError> {
        let window = TimeWindow::around(now);
        debug!(
            calendar_id,
            start = %window.start,
            end = %window.end,
            "Fetching events"
        );

        let mut response = self
            .bounded(self.source.get_events(calendar_id, &window))
            .await?
            .ok_or(FetchError::NoEventsOrUnavailable)?;

        let events = response
            .remove(calendar_id)
            .map(|calendar| calendar.events)
            .ok_or(FetchError::NoEventsOrUnavailable)?;

        if events.is_empty() && !self.allow_empty {
            return Err(FetchError::NoEventsOrUnavailable);
        }

        debug!(calendar_id, count = events.len(), "Fetched events");
        Ok(events)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = SourceResult<T>>,
    ) -> Result<T, FetchError> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(FetchError::from),
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for EventFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFetcher")
            .field("source", &self.source.name())
            .field("timeout", &self.timeout)
            .field("allow_empty", &self.allow_empty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{BoxFuture, CalendarState, EventsResponse};
    use crate::static_source::{StaticCalendar, StaticSource};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn fetcher(source: impl CalendarSource + 'static) -> EventFetcher {
        EventFetcher::new(Arc::new(source), EventFetcher::DEFAULT_TIMEOUT)
    }

    fn family() -> StaticSource {
        StaticSource::new()
            .with_calendar(
                "calendar.family",
                StaticCalendar::new(
                    "Family",
                    vec![
                        EventRecord::new(
                            "2024-03-01T10:00:00+00:00",
                            "2024-03-01T11:00:00+00:00",
                        )
                        .with_summary("Dentist"),
                    ],
                ),
            )
            .with_calendar("calendar.empty", StaticCalendar::new("Empty", vec![]))
            .with_calendar("calendar.nameless", StaticCalendar::default())
            .with_calendar(
                "calendar.broken",
                StaticCalendar {
                    available: false,
                    ..StaticCalendar::new("Broken", vec![])
                },
            )
    }

    #[tokio::test]
    async fn name_of_known_calendar() {
        let name = fetcher(family()).calendar_name("calendar.family").await.unwrap();
        assert_eq!(name, "Family");
    }

    #[tokio::test]
    async fn unknown_or_nameless_calendar_is_not_found() {
        let fetcher = fetcher(family());
        let err = fetcher.calendar_name("calendar.nope").await.unwrap_err();
        assert!(matches!(err, FetchError::CalendarNotFound));
        assert_eq!(err.status(), 404);

        let err = fetcher.calendar_name("calendar.nameless").await.unwrap_err();
        assert!(matches!(err, FetchError::CalendarNotFound));
    }

    #[tokio::test]
    async fn unavailable_calendar() {
        let err = fetcher(family())
            .calendar_name("calendar.broken")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::CalendarUnavailable));
        assert_eq!(err.status(), 503);
    }

    #[tokio::test]
    async fn events_of_known_calendar() {
        let events = fetcher(family())
            .fetch_events("calendar.family", now())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary.as_deref(), Some("Dentist"));
    }

    #[tokio::test]
    async fn empty_events_are_an_error_by_default() {
        let err = fetcher(family())
            .fetch_events("calendar.empty", now())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NoEventsOrUnavailable));
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn empty_events_allowed_when_enabled() {
        let events = fetcher(family())
            .with_empty_feeds(true)
            .fetch_events("calendar.empty", now())
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn missing_mapping_is_no_events() {
        let err = fetcher(family())
            .fetch_events("calendar.nope", now())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NoEventsOrUnavailable));
    }

    struct WrongKeySource;

    impl CalendarSource for WrongKeySource {
        fn name(&self) -> &str {
            "wrong_key"
        }

        fn calendar_state<'a>(
            &'a self,
            _calendar_id: &'a str,
        ) -> BoxFuture<'a, SourceResult<Option<CalendarState>>> {
            Box::pin(async { Ok(Some(CalendarState::named("Other"))) })
        }

        fn get_events<'a>(
            &'a self,
            _calendar_id: &'a str,
            _window: &'a TimeWindow,
        ) -> BoxFuture<'a, SourceResult<Option<EventsResponse>>> {
            Box::pin(async {
                let mut response = EventsResponse::new();
                response.insert("calendar.other".to_string(), Default::default());
                Ok(Some(response))
            })
        }
    }

    #[tokio::test]
    async fn mapping_without_calendar_is_no_events() {
        let err = fetcher(WrongKeySource)
            .with_empty_feeds(true)
            .fetch_events("calendar.family", now())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NoEventsOrUnavailable));
    }

    struct BrokenSource;

    impl CalendarSource for BrokenSource {
        fn name(&self) -> &str {
            "broken"
        }

        fn calendar_state<'a>(
            &'a self,
            _calendar_id: &'a str,
        ) -> BoxFuture<'a, SourceResult<Option<CalendarState>>> {
            Box::pin(async { Err(SourceError::network("connection refused")) })
        }

        fn get_events<'a>(
            &'a self,
            _calendar_id: &'a str,
            _window: &'a TimeWindow,
        ) -> BoxFuture<'a, SourceResult<Option<EventsResponse>>> {
            Box::pin(async { Err(SourceError::network("connection refused")) })
        }
    }

    #[tokio::test]
    async fn source_failure_is_propagated() {
        let err = fetcher(BrokenSource)
            .fetch_events("calendar.family", now())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Source(_)));
        assert_eq!(err.status(), 502);
        assert_eq!(err.as_str(), "source_error");
    }

    struct SlowSource;

    impl CalendarSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        fn calendar_state<'a>(
            &'a self,
            _calendar_id: &'a str,
        ) -> BoxFuture<'a, SourceResult<Option<CalendarState>>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            })
        }

        fn get_events<'a>(
            &'a self,
            _calendar_id: &'a str,
            _window: &'a TimeWindow,
        ) -> BoxFuture<'a, SourceResult<Option<EventsResponse>>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(None)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let fetcher = EventFetcher::new(Arc::new(SlowSource), Duration::from_secs(5));
        assert_eq!(fetcher.source_name(), "slow");
        assert_eq!(fetcher.timeout(), Duration::from_secs(5));

        let err = fetcher.calendar_name("calendar.family").await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(d) if d == Duration::from_secs(5)));
        assert_eq!(err.status(), 504);

        let err = fetcher
            .fetch_events("calendar.family", now())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }
}
