//! Wire types for the calendar provider API

use cadence_domain::{Attendee, CalendarEvent, EventCategory};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One event as the provider serializes it.
///
/// Kept separate from the domain type so a provider omitting optional
/// fields still deserializes; only `id`, `title`, `start` and `end`
/// are required.
#[derive(Debug, Deserialize)]
pub(crate) struct WireEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub attendees: Vec<WireAttendee>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub category: EventCategory,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireAttendee {
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListEventsResponse {
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

impl From<WireEvent> for CalendarEvent {
    fn from(wire: WireEvent) -> Self {
        CalendarEvent {
            id: wire.id,
            title: wire.title,
            start: wire.start,
            end: wire.end,
            timezone: wire.timezone,
            attendees: wire
                .attendees
                .into_iter()
                .map(|a| Attendee {
                    email: a.email,
                    display_name: a.display_name,
                    optional: a.optional,
                })
                .collect(),
            is_all_day: wire.all_day,
            category: wire.category,
        }
    }
}
