//! Read-side schedule views
//!
//! Thin service over the calendar gateway that assembles derived day
//! views. Nothing here writes; event creation goes through the event
//! writer only.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use cadence_domain::{CadenceError, DaySchedule, Preferences, Result};

use crate::availability::assemble_day_schedule;
use crate::workflow::ports::CalendarGateway;

/// Assembles schedule views for the presentation layer.
pub struct ScheduleService {
    calendar: Arc<dyn CalendarGateway>,
}

impl ScheduleService {
    pub fn new(calendar: Arc<dyn CalendarGateway>) -> Self {
        Self { calendar }
    }

    /// Build the full view of one local day under the user's
    /// preferences: events, free slots, and aggregate stats.
    pub async fn day_view(&self, date: NaiveDate, prefs: &Preferences) -> Result<DaySchedule> {
        let tz = prefs.timezone.parse::<Tz>().map_err(|_| {
            CadenceError::Validation(format!("unknown timezone: {}", prefs.timezone))
        })?;

        let day_start = tz
            .from_local_datetime(&date.and_time(NaiveTime::MIN))
            .earliest()
            .ok_or_else(|| {
                CadenceError::Validation(format!("midnight does not exist on {date} in {tz}"))
            })?
            .with_timezone(&Utc);
        let day_end = day_start + Duration::days(1);

        let events = self.calendar.list_events(day_start, day_end).await?;
        assemble_day_schedule(
            events,
            date,
            &prefs.working_hours,
            &prefs.protected_rules,
            &prefs.timezone,
        )
    }
}
