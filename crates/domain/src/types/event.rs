//! Calendar event types
//!
//! Events are sourced from an external calendar provider. The engine
//! never mutates existing events, it only reads them and creates new
//! ones through the event writer.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a calendar event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// An internal meeting with attendees.
    #[default]
    Meeting,
    /// A meeting with external participants.
    External,
    /// Blocked focus time.
    Focus,
    /// Personal time.
    Personal,
}

/// An attendee on a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self { email: email.into(), display_name: None, optional: false }
    }
}

/// A calendar event as returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Provider-assigned identifier.
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA timezone the event was scheduled in.
    pub timezone: String,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub category: EventCategory,
}

impl CalendarEvent {
    /// Create a new event with a generated id.
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            start,
            end,
            timezone: timezone.into(),
            attendees: Vec::new(),
            is_all_day: false,
            category: EventCategory::Meeting,
        }
    }

    /// Set the event category.
    pub fn with_category(mut self, category: EventCategory) -> Self {
        self.category = category;
        self
    }

    /// Mark as an all-day event.
    pub fn all_day(mut self) -> Self {
        self.is_all_day = true;
        self
    }

    /// Add an attendee.
    pub fn with_attendee(mut self, attendee: Attendee) -> Self {
        self.attendees.push(attendee);
        self
    }

    /// Duration of the event.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Strict half-open interval overlap check.
    ///
    /// Back-to-back events sharing a boundary instant do not overlap.
    pub fn overlaps_with(&self, other: &CalendarEvent) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// A request to create a new calendar event.
///
/// This is the untrusted input to the event writer; it is validated
/// and normalized before any provider call is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub timezone: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl EventDraft {
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            timezone: timezone.into(),
            attendees: Vec::new(),
            description: None,
            location: None,
        }
    }

    pub fn with_attendees(mut self, attendees: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.attendees.extend(attendees.into_iter().map(Into::into));
        self
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}
