//! iCalendar feed serialization.
//!
//! [`serialize`] turns the events of one calendar into a complete VCALENDAR
//! document. Output is deterministic: the same events always produce the
//! same text, including the per-event UIDs, so subscribing clients can
//! match events across refreshes.
//!
//! # Example
//!
//! ```
//! use icsfeed_core::{EventRecord, FeedInput, FeedOptions, serialize};
//!
//! let events = vec![
//!     EventRecord::new("2024-03-01T10:00:00+00:00", "2024-03-01T11:00:00+00:00")
//!         .with_summary("Dentist"),
//! ];
//! let feed = FeedInput::new("calendar.family", "Family");
//! let ics = serialize(&feed, &events, &[], &FeedOptions::default()).unwrap();
//!
//! assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
//! assert!(ics.contains("DTSTART:20240301T100000Z\r\n"));
//! assert!(ics.ends_with("END:VCALENDAR"));
//! ```

pub mod text;

#[cfg(test)]
mod golden_tests;

use std::fmt;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use crate::event::EventRecord;
use crate::registry::ColorRule;
use crate::time::{EventTime, TimeParseError};

pub use text::{escape_text, html_escape, text_value};

/// PRODID written into every feed.
pub const PRODUCT_ID: &str = "-//icsfeed//iCal Subscription 1.0//EN";

/// Domain of the synthesized organizer mailbox.
pub const DEFAULT_ORGANIZER_DOMAIN: &str = "homeassistant.local";

/// Stand-in for a missing summary in the UID input.
pub const NO_SUMMARY: &str = "None";

/// Which time field of an event failed to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventField {
    Start,
    End,
}

impl fmt::Display for EventField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "start"),
            Self::End => write!(f, "end"),
        }
    }
}

/// Errors produced while building a feed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// An event time matched neither the datetime nor the date format, or
    /// the end is not of the same kind (datetime or date) as the start.
    #[error("event #{index} has a malformed {field}: {value:?}")]
    MalformedEvent {
        /// Position of the event in the source order.
        index: usize,
        /// The offending field.
        field: EventField,
        /// The raw value.
        value: String,
    },
}

impl FeedError {
    fn malformed(index: usize, field: EventField, err: TimeParseError) -> Self {
        Self::MalformedEvent {
            index,
            field,
            value: err.value,
        }
    }
}

/// Calendar-level metadata for one feed.
#[derive(Debug, Clone, Copy)]
pub struct FeedInput<'a> {
    /// The calendar entity identifier.
    pub calendar_id: &'a str,
    /// Human-readable calendar name.
    pub display_name: &'a str,
    /// Optional calendar color.
    pub color: Option<&'a str>,
}

impl<'a> FeedInput<'a> {
    /// Creates feed metadata without a color.
    pub fn new(calendar_id: &'a str, display_name: &'a str) -> Self {
        Self {
            calendar_id,
            display_name,
            color: None,
        }
    }

    /// Builder method to set the calendar color.
    pub fn with_color(mut self, color: Option<&'a str>) -> Self {
        self.color = color;
        self
    }
}

/// Deployment-wide serialization settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOptions {
    /// Domain used for the `MAILTO:` organizer address.
    pub organizer_domain: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            organizer_domain: DEFAULT_ORGANIZER_DOMAIN.to_string(),
        }
    }
}

impl FeedOptions {
    /// Builder: set the organizer domain.
    pub fn with_organizer_domain(mut self, domain: impl Into<String>) -> Self {
        self.organizer_domain = domain.into();
        self
    }
}

/// Serializes a calendar and its events into an iCalendar document.
///
/// Events are written in the order given. The document uses CRLF line
/// endings, folds long lines, and has no line break after `END:VCALENDAR`.
///
/// # Errors
///
/// Returns [`FeedError::MalformedEvent`] for the first event whose start or
/// end cannot be parsed, or that mixes a datetime with a date; no partial
/// document is produced.
pub fn serialize(
    feed: &FeedInput<'_>,
    events: &[EventRecord],
    color_rules: &[ColorRule],
    options: &FeedOptions,
) -> Result<String, FeedError> {
    let display_name = text_value(feed.display_name);
    let escaped_id = escape_text(feed.calendar_id);

    let mut doc = ContentLines::new();
    doc.push("BEGIN:VCALENDAR");
    doc.push("VERSION:2.0");
    doc.push(&format!("PRODID:{PRODUCT_ID}"));
    doc.push("CALSCALE:GREGORIAN");
    doc.push("METHOD:PUBLISH");
    doc.push(&format!(
        "ORGANIZER;CN=\"{}\":MAILTO:{}@{}",
        text::param_value(feed.display_name),
        feed.calendar_id,
        options.organizer_domain
    ));
    doc.push(&format!("NAME:{display_name}"));
    doc.push(&format!("X-WR-CALNAME:{display_name}"));
    if let Some(color) = feed.color {
        doc.push(&format!("COLOR:{color}"));
    }

    for (index, event) in events.iter().enumerate() {
        write_event(&mut doc, index, event, &escaped_id, color_rules)?;
    }

    doc.push("END:VCALENDAR");

    debug!(
        calendar_id = feed.calendar_id,
        events = events.len(),
        "Serialized feed"
    );

    Ok(doc.finish())
}

fn write_event(
    doc: &mut ContentLines,
    index: usize,
    event: &EventRecord,
    escaped_id: &str,
    color_rules: &[ColorRule],
) -> Result<(), FeedError> {
    let start = event
        .start_time()
        .map_err(|e| FeedError::malformed(index, EventField::Start, e))?;
    let end = event
        .end_time()
        .map_err(|e| FeedError::malformed(index, EventField::End, e))?;
    if start.is_all_day() != end.is_all_day() {
        return Err(FeedError::MalformedEvent {
            index,
            field: EventField::End,
            value: event.end.clone(),
        });
    }
    let summary = event.summary.as_deref().map(text_value);

    doc.push("BEGIN:VEVENT");
    doc.push(&format!(
        "UID:{}",
        event_uid(escaped_id, &start, &end, summary.as_deref())
    ));
    doc.push(&format!("DTSTAMP:{}", start.to_ical_stamp()));
    doc.push(&date_property("DTSTART", &start));
    doc.push(&date_property("DTEND", &end));

    if let Some(ref summary) = summary {
        doc.push(&format!("SUMMARY:{summary}"));
    }
    if let Some(ref description) = event.description {
        doc.push(&format!("DESCRIPTION:{}", text_value(description)));
    }
    if let Some(ref location) = event.location {
        doc.push(&format!("LOCATION:{}", text_value(location)));
    }

    if let (Some(raw), Some(escaped)) = (event.summary.as_deref(), summary.as_deref()) {
        for rule in color_rules {
            // Rule names are written unescaped in config, so the raw summary counts too.
            if rule.matches(escaped) || rule.matches(raw) {
                doc.push(&format!("COLOR:{}", rule.color));
            }
        }
    }

    doc.push("END:VEVENT");
    Ok(())
}

fn date_property(name: &str, time: &EventTime) -> String {
    if time.is_all_day() {
        format!("{name};VALUE=DATE:{}", time.to_ical())
    } else {
        format!("{name}:{}", time.to_ical())
    }
}

/// Computes the stable UID of an event.
///
/// The UID is the hex SHA-256 of `{calendar_id}-{start}-{end}-{summary}`
/// where the times are in their iCalendar form and a missing summary is
/// replaced by [`NO_SUMMARY`].
pub fn event_uid(
    escaped_calendar_id: &str,
    start: &EventTime,
    end: &EventTime,
    escaped_summary: Option<&str>,
) -> String {
    let input = format!(
        "{}-{}-{}-{}",
        escaped_calendar_id,
        start.to_ical(),
        end.to_ical(),
        escaped_summary.unwrap_or(NO_SUMMARY)
    );
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Append-only list of content lines.
struct ContentLines {
    lines: Vec<String>,
}

impl ContentLines {
    fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Adds a logical line. Continuation sequences already present in the
    /// line are kept; each physical segment is folded on its own.
    fn push(&mut self, line: &str) {
        let mut folded = String::with_capacity(line.len());
        for (i, segment) in line.split(text::CRLF).enumerate() {
            if i > 0 {
                folded.push_str(text::CRLF);
            }
            text::fold_into(&mut folded, segment);
        }
        self.lines.push(folded);
    }

    fn finish(self) -> String {
        self.lines.join(text::CRLF)
    }
}
