//! Configuration registry.
//!
//! The [`Registry`] maps calendar identifiers to their feed secret and
//! optional color, and carries the global list of [`ColorRule`]s. It is built
//! once at startup and shared read-only between requests.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Prefix every servable calendar identifier starts with.
pub const CALENDAR_PREFIX: &str = "calendar.";

/// Feed settings for one calendar.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// The calendar entity identifier (e.g. `calendar.family`).
    pub calendar_id: String,
    /// Shared secret a subscriber must present.
    pub secret: String,
    /// Calendar-level color emitted in the feed header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl CalendarConfig {
    /// Creates a calendar entry without a color.
    pub fn new(calendar_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            secret: secret.into(),
            color: None,
        }
    }

    /// Builder method to set the calendar color.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Returns true if the identifier names a calendar entity.
    pub fn is_calendar(&self) -> bool {
        self.calendar_id.starts_with(CALENDAR_PREFIX)
    }
}

// The secret must never end up in logs, so Debug is written by hand.
impl std::fmt::Debug for CalendarConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarConfig")
            .field("calendar_id", &self.calendar_id)
            .field("secret", &"<redacted>")
            .field("color", &self.color)
            .finish()
    }
}

/// Assigns a color to every event whose summary equals `event_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRule {
    /// Exact (escaped) event summary to match.
    pub event_name: String,
    /// Color value written to the COLOR property.
    pub color: String,
}

impl ColorRule {
    /// Creates a new color rule.
    pub fn new(event_name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            color: color.into(),
        }
    }

    /// Returns true if this rule applies to the given summary.
    pub fn matches(&self, summary: &str) -> bool {
        self.event_name == summary
    }
}

/// Read-only lookup of calendar feed settings.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    calendars: HashMap<String, CalendarConfig>,
    color_rules: Vec<ColorRule>,
}

impl Registry {
    /// Builds a registry from calendar entries and color rules.
    ///
    /// Later entries replace earlier ones with the same identifier.
    pub fn new(
        calendars: impl IntoIterator<Item = CalendarConfig>,
        color_rules: Vec<ColorRule>,
    ) -> Self {
        let mut map = HashMap::new();
        for calendar in calendars {
            if !calendar.is_calendar() {
                warn!(
                    calendar_id = %calendar.calendar_id,
                    "Configured entity is not a calendar, requests for it will be rejected"
                );
            }
            if calendar.secret.is_empty() {
                warn!(
                    calendar_id = %calendar.calendar_id,
                    "Calendar has an empty secret and will not be served"
                );
            }
            if let Some(previous) = map.insert(calendar.calendar_id.clone(), calendar) {
                warn!(
                    calendar_id = %previous.calendar_id,
                    "Calendar configured more than once, using the last entry"
                );
            }
        }

        Self {
            calendars: map,
            color_rules,
        }
    }

    /// Returns the entry for `calendar_id` if it has a secret configured.
    pub fn get(&self, calendar_id: &str) -> Option<&CalendarConfig> {
        self.calendars
            .get(calendar_id)
            .filter(|calendar| !calendar.secret.is_empty())
    }

    /// Returns the global color rules in configuration order.
    pub fn color_rules(&self) -> &[ColorRule] {
        &self.color_rules
    }

    /// Returns the configured calendar identifiers, sorted.
    pub fn calendar_ids(&self) -> Vec<&str> {
        let mut ids: Vec<_> = self.calendars.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the number of configured calendars.
    pub fn len(&self) -> usize {
        self.calendars.len()
    }

    /// Returns true if no calendar is configured.
    pub fn is_empty(&self) -> bool {
        self.calendars.is_empty()
    }
}
