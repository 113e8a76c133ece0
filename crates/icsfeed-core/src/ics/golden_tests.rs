//! Golden tests for feed output.
//!
//! The full document is pinned with an inline insta snapshot; line endings
//! are normalized to `\n` for readability.

use crate::event::EventRecord;
use crate::ics::{FeedInput, FeedOptions, serialize};
use crate::registry::ColorRule;

fn sample_events() -> Vec<EventRecord> {
    vec![
        EventRecord::new("2024-03-01T10:00:00+00:00", "2024-03-01T11:00:00+00:00")
            .with_summary("Dentist")
            .with_location("Smile Clinic"),
        EventRecord::new("2024-03-08", "2024-03-09").with_summary("School holiday"),
    ]
}

#[test]
fn golden_family_feed() {
    let feed = FeedInput::new("calendar.family", "Family").with_color(Some("#3366ff"));
    let rules = vec![ColorRule::new("Dentist", "red")];

    let ics = serialize(&feed, &sample_events(), &rules, &FeedOptions::default()).unwrap();

    insta::assert_snapshot!(ics.replace("\r\n", "\n"), @r#"
    BEGIN:VCALENDAR
    VERSION:2.0
    PRODID:-//icsfeed//iCal Subscription 1.0//EN
    CALSCALE:GREGORIAN
    METHOD:PUBLISH
    ORGANIZER;CN="Family":MAILTO:calendar.family@homeassistant.local
    NAME:Family
    X-WR-CALNAME:Family
    COLOR:#3366ff
    BEGIN:VEVENT
    UID:ba6f93b0f0ba853f5acdd461eb4cade347d39462183115faebd6e0b2168a5c9d
    DTSTAMP:20240301T100000Z
    DTSTART:20240301T100000Z
    DTEND:20240301T110000Z
    SUMMARY:Dentist
    LOCATION:Smile Clinic
    COLOR:red
    END:VEVENT
    BEGIN:VEVENT
    UID:88d603189473d44017cfc56834687e9a2157f3db562fa4ae710ca731f01d4625
    DTSTAMP:20240308T000000Z
    DTSTART;VALUE=DATE:20240308
    DTEND;VALUE=DATE:20240309
    SUMMARY:School holiday
    END:VEVENT
    END:VCALENDAR
    "#);
}

#[test]
fn golden_empty_feed() {
    let feed = FeedInput::new("calendar.empty", "No <plans>");
    let ics = serialize(&feed, &[], &[], &FeedOptions::default()).unwrap();

    insta::assert_snapshot!(ics.replace("\r\n", "\n"), @r#"
    BEGIN:VCALENDAR
    VERSION:2.0
    PRODID:-//icsfeed//iCal Subscription 1.0//EN
    CALSCALE:GREGORIAN
    METHOD:PUBLISH
    ORGANIZER;CN="No &lt;plans&gt;":MAILTO:calendar.empty@homeassistant.local
    NAME:No &lt\;plans&gt\;
    X-WR-CALNAME:No &lt\;plans&gt\;
    END:VCALENDAR
    "#);
}
