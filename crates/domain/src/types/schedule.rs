//! Schedule view types: free slots, protected time, day summaries
//!
//! Everything here is derived data, recomputed per request from the
//! current events and preferences. Nothing is persisted.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::CalendarEvent;

/// A half-open interval `[start, end)` of schedulable or blocked time.
///
/// Produced only by the availability service; invariant `start < end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub available: bool,
    /// Timezone string of the caller's view; slots are not reprojected.
    pub timezone: String,
}

impl TimeSlot {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// A recurring, day-of-week scoped interval the user never wants
/// scheduled over.
///
/// `start`/`end` are zero-padded 24h `HH:MM` strings with
/// `start < end`. Days use 0=Sunday .. 6=Saturday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedTimeRule {
    pub label: String,
    pub start: String,
    pub end: String,
    pub days_of_week: Vec<u8>,
}

impl ProtectedTimeRule {
    /// Check that both ends are real clock times with `start < end`
    /// and every day index is in range. Rules often arrive from
    /// untrusted plan params, so a rule that fails here must never be
    /// stored or applied.
    pub fn is_valid(&self) -> bool {
        let parsed = parse_rule_time(&self.start).zip(parse_rule_time(&self.end));
        matches!(parsed, Some((start, end)) if start < end)
            && self.days_of_week.iter().all(|d| *d <= 6)
    }

    /// Whether the rule applies on the given date.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        let dow = date.weekday().num_days_from_sunday() as u8;
        self.days_of_week.contains(&dow)
    }
}

fn parse_rule_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()
}

/// A user's working-hours window as `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self { start: "09:00".to_string(), end: "17:00".to_string() }
    }
}

/// Aggregate minute counts for a day view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStats {
    pub meeting_minutes: i64,
    pub focus_minutes: i64,
    pub available_minutes: i64,
}

/// A single day's assembled schedule view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub timezone: String,
    pub events: Vec<CalendarEvent>,
    pub available_slots: Vec<TimeSlot>,
    pub stats: ScheduleStats,
}
