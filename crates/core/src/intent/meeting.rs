//! Validation of extracted meetings
//!
//! Coerces the untrusted [`ExtractedMeeting`] shape into a fully
//! resolved meeting: bounded title, clamped duration, concrete date
//! and time, and only plausible attendee emails. Invalid values are
//! clamped or defaulted rather than rejected; the only silently
//! dropped data is an implausible attendee entry.

use chrono::{Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use cadence_common::{is_valid_email, parse_clock_time, truncate_chars};
use cadence_domain::{CadenceError, EventDraft, ExtractedMeeting, Preferences, Result};

const MIN_DURATION_MINUTES: i64 = 15;
const MAX_DURATION_MINUTES: i64 = 480;
const MAX_TITLE_CHARS: usize = 100;
const FALLBACK_TIME: &str = "10:00";

/// A meeting whose fields have all been validated and resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedMeeting {
    pub title: String,
    pub duration_minutes: u32,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub attendees: Vec<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

impl ValidatedMeeting {
    /// Build an event draft in the given timezone.
    pub fn to_draft(&self, timezone: &str) -> Result<EventDraft> {
        let tz = timezone
            .parse::<Tz>()
            .map_err(|_| CadenceError::Validation(format!("unknown timezone: {timezone}")))?;
        let start = tz
            .from_local_datetime(&self.date.and_time(self.time))
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| {
                CadenceError::Validation(format!(
                    "local time {} {} does not exist in {timezone}",
                    self.date, self.time
                ))
            })?;
        let end = start + Duration::minutes(i64::from(self.duration_minutes));

        let mut draft = EventDraft::new(self.title.clone(), start, end, timezone)
            .with_attendees(self.attendees.iter().cloned());
        draft.description = self.description.clone();
        draft.location = self.location.clone();
        Ok(draft)
    }
}

/// Validate an extracted meeting against the user's preferences.
///
/// `today` is the current date in the user's timezone; the date
/// heuristics are relative to it.
pub fn validate_meeting(
    raw: ExtractedMeeting,
    original_message: &str,
    prefs: &Preferences,
    today: NaiveDate,
) -> ValidatedMeeting {
    let title = {
        let trimmed = raw.title.trim();
        if trimmed.is_empty() {
            "Meeting".to_string()
        } else {
            truncate_chars(trimmed, MAX_TITLE_CHARS)
        }
    };

    let duration_minutes = raw
        .duration_minutes
        .filter(|minutes| *minutes > 0)
        .unwrap_or_else(|| i64::from(prefs.default_meeting_minutes))
        .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES) as u32;

    let date = raw
        .date
        .as_deref()
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .unwrap_or_else(|| heuristic_date(original_message, today));

    let time = raw
        .time
        .as_deref()
        .and_then(parse_clock_time)
        .or_else(|| parse_clock_time(&prefs.working_hours.start))
        .or_else(|| parse_clock_time(FALLBACK_TIME))
        .unwrap_or(NaiveTime::MIN);

    let attendees: Vec<String> = raw
        .attendees
        .into_iter()
        .map(|attendee| attendee.trim().to_string())
        .filter(|attendee| is_valid_email(attendee))
        .collect();

    ValidatedMeeting {
        title,
        duration_minutes,
        date,
        time,
        attendees,
        description: raw.description.filter(|text| !text.trim().is_empty()),
        location: raw.location.filter(|text| !text.trim().is_empty()),
    }
}

/// Keyword scan of the original request when the model supplied no
/// date: `tomorrow`, `today`, a named weekday, `next week`; otherwise
/// tomorrow.
pub(crate) fn heuristic_date(message: &str, today: NaiveDate) -> NaiveDate {
    mentioned_date(message, today).unwrap_or_else(|| today + Duration::days(1))
}

/// The date the request text mentions, if it mentions one at all.
pub(crate) fn mentioned_date(message: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = message.to_lowercase();
    if lower.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if lower.contains("today") {
        return Some(today);
    }
    if let Some(date) = named_weekday(&lower, today) {
        return Some(date);
    }
    if lower.contains("next week") {
        return Some(today + Duration::days(7));
    }
    None
}

/// Resolve the next occurrence of a weekday mentioned by name.
///
/// Mentioning today's own weekday means next week's, not today.
fn named_weekday(lower_message: &str, today: NaiveDate) -> Option<NaiveDate> {
    use chrono::Datelike;

    const DAYS: [(&str, Weekday); 7] = [
        ("monday", Weekday::Mon),
        ("tuesday", Weekday::Tue),
        ("wednesday", Weekday::Wed),
        ("thursday", Weekday::Thu),
        ("friday", Weekday::Fri),
        ("saturday", Weekday::Sat),
        ("sunday", Weekday::Sun),
    ];

    for (name, weekday) in DAYS {
        if lower_message.contains(name) {
            let today_num = today.weekday().num_days_from_sunday();
            let target_num = weekday.num_days_from_sunday();
            let mut ahead = (target_num + 7 - today_num) % 7;
            if ahead == 0 {
                ahead = 7;
            }
            return Some(today + Duration::days(i64::from(ahead)));
        }
    }
    None
}
