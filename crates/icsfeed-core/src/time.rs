//! Time types for feed events.
//!
//! This module provides [`EventTime`], the parsed form of an event's start or
//! end (either a specific instant or an all-day date), and [`TimeWindow`],
//! the range every events query is bounded by.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Weeks of history included in every feed.
pub const LOOKBACK_WEEKS: i64 = 4;

/// Weeks of upcoming events included in every feed.
pub const LOOKAHEAD_WEEKS: i64 = 52;

const OFFSET_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Returned when an event time is neither a datetime with offset nor a date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized event time {value:?}")]
pub struct TimeParseError {
    /// The rejected input.
    pub value: String,
}

/// Represents the start or end of a feed event.
///
/// Event sources hand out two kinds of times:
/// - **DateTime**: a specific instant, normalized to UTC
/// - **AllDay**: a calendar date without a time component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific datetime, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day event date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Parses an event time as delivered by a calendar source.
    ///
    /// Datetimes must carry a UTC offset (`2024-03-01T10:00:00+01:00`,
    /// fractional seconds and `Z` allowed); anything else must be a plain
    /// `YYYY-MM-DD` date.
    pub fn parse(value: &str) -> Result<Self, TimeParseError> {
        let trimmed = value.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::DateTime(dt.with_timezone(&Utc)));
        }
        if let Ok(dt) = DateTime::parse_from_str(trimmed, OFFSET_DATETIME_FORMAT) {
            return Ok(Self::DateTime(dt.with_timezone(&Utc)));
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Ok(Self::AllDay(date));
        }

        Err(TimeParseError {
            value: value.to_string(),
        })
    }

    /// Returns `true` if this is an all-day event time.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Converts to a UTC datetime for comparison purposes.
    ///
    /// For all-day events, returns midnight UTC on that date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Formats the value for DTSTART/DTEND.
    ///
    /// Datetimes become `YYYYMMDDTHHMMSSZ`, dates become `YYYYMMDD`.
    pub fn to_ical(&self) -> String {
        match self {
            Self::DateTime(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            Self::AllDay(date) => date.format("%Y%m%d").to_string(),
        }
    }

    /// Formats the value for DTSTAMP, which is always a UTC datetime.
    ///
    /// All-day dates are stamped at midnight.
    pub fn to_ical_stamp(&self) -> String {
        match self {
            Self::DateTime(_) => self.to_ical(),
            Self::AllDay(date) => date.format("%Y%m%dT000000Z").to_string(),
        }
    }
}

/// A time window for querying calendar events.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The feed window: [`LOOKBACK_WEEKS`] before `now` up to
    /// [`LOOKAHEAD_WEEKS`] after it.
    pub fn around(now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::weeks(LOOKBACK_WEEKS),
            end: now + Duration::weeks(LOOKAHEAD_WEEKS),
        }
    }

    /// Returns true if the range `[start, end)` intersects the window.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_utc_datetime() {
        let time = EventTime::parse("2024-03-01T10:00:00+00:00").unwrap();
        assert_eq!(
            time,
            EventTime::DateTime(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
        assert!(!time.is_all_day());
    }

    #[test]
    fn parse_offset_is_normalized_to_utc() {
        let time = EventTime::parse("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(time.to_ical(), "20240301T080000Z");

        let time = EventTime::parse("2024-03-01T23:30:00-05:00").unwrap();
        assert_eq!(time.to_ical(), "20240302T043000Z");
    }

    #[test]
    fn parse_offset_without_colon() {
        let time = EventTime::parse("2024-03-01T10:00:00+0100").unwrap();
        assert_eq!(time.to_ical(), "20240301T090000Z");
    }

    #[test]
    fn parse_fractional_seconds_and_zulu() {
        let time = EventTime::parse("2024-03-01T10:00:00.250Z").unwrap();
        assert_eq!(time.to_ical(), "20240301T100000Z");
    }

    #[test]
    fn parse_date_only() {
        let time = EventTime::parse("2024-03-01").unwrap();
        assert!(time.is_all_day());
        assert_eq!(time.to_ical(), "20240301");
        assert_eq!(time.to_ical_stamp(), "20240301T000000Z");
    }

    #[test]
    fn parse_rejects_naive_datetime() {
        let err = EventTime::parse("2024-03-01T10:00:00").unwrap_err();
        assert_eq!(err.value, "2024-03-01T10:00:00");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(EventTime::parse("tomorrow").is_err());
        assert!(EventTime::parse("").is_err());
        assert!(EventTime::parse("2024-13-01").is_err());
    }

    #[test]
    fn all_day_compares_at_midnight() {
        let time = EventTime::parse("2024-03-01").unwrap();
        assert_eq!(
            time.to_utc_datetime(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn datetime_stamp_equals_value() {
        let time = EventTime::parse("2024-03-01T10:00:00+00:00").unwrap();
        assert_eq!(time.to_ical_stamp(), time.to_ical());
    }

    #[test]
    fn feed_window_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::around(now);

        assert_eq!(window.start, now - Duration::days(28));
        assert_eq!(window.end, now + Duration::days(364));
        assert_eq!(window.end - window.start, Duration::weeks(56));
    }

    #[test]
    fn window_overlap() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = TimeWindow {
            start: now,
            end: now + Duration::hours(2),
        };

        assert!(window.overlaps(now - Duration::hours(1), now + Duration::minutes(1)));
        assert!(window.overlaps(now + Duration::hours(1), now + Duration::hours(5)));
        assert!(!window.overlaps(now - Duration::hours(2), now));
        assert!(!window.overlaps(now + Duration::hours(2), now + Duration::hours(3)));
    }
}
