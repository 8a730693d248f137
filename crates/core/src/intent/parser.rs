//! Tolerant parsing of raw NLU responses
//!
//! Models wrap JSON in markdown fences, preface it with prose, or
//! return something that is not JSON at all. The cleaning procedure
//! strips a leading ```` ```json ```` fence and anything outside the
//! outermost braces before parsing; if the payload is still unusable a
//! heuristic plan is built from the original request text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use cadence_common::{is_valid_email, truncate_chars};
use cadence_domain::{ExtractedMeeting, IntentPlan, IntentStep, StepKind};

/// Leading scheduling verbiage removed when deriving a title from the
/// raw request text.
static TITLE_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"(?i)^(?:please\s+)?(?:can\s+you\s+)?(?:schedule|set\s+up|book|create|add|plan)\s+(?:a\s+|an\s+)?(?:meeting|call|event|time)?\s*(?:with\s+)?",
    )
    .expect("title prefix regex is valid")
});

/// Loose email matcher for scanning free text.
static EMAIL_SCAN_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("email scan regex is valid")
});

/// Strip markdown fences and surrounding prose, leaving the outermost
/// JSON object, if any.
fn clean_json_payload(raw: &str) -> Option<&str> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }

    let first = text.find('{')?;
    let last = text.rfind('}')?;
    (first <= last).then(|| &text[first..=last])
}

/// Parse a raw NLU response into an intent plan.
///
/// Never fails: if the payload lacks a usable `steps` array the
/// fallback single-step schedule plan built from the original message
/// is returned instead.
pub fn parse_intent_plan(raw: &str, original_message: &str) -> IntentPlan {
    if let Some(payload) = clean_json_payload(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(payload) {
            if let Some(items) = value.get("steps").and_then(Value::as_array) {
                let steps: Vec<IntentStep> = items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect();
                if !steps.is_empty() {
                    return IntentPlan { steps };
                }
            }
        }
    }

    debug!("NLU plan payload unusable, building heuristic plan");
    fallback_plan(original_message)
}

/// Parse a raw NLU response into extracted meetings.
///
/// Expects a `meetings` array; degrades to a single heuristic meeting
/// with no attendees and the default duration left for the validator.
pub fn parse_extracted_meetings(raw: &str, original_message: &str) -> Vec<ExtractedMeeting> {
    if let Some(payload) = clean_json_payload(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(payload) {
            if let Some(items) = value.get("meetings").and_then(Value::as_array) {
                let meetings: Vec<ExtractedMeeting> = items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect();
                if !meetings.is_empty() {
                    return meetings;
                }
            }
        }
    }

    debug!("NLU meeting payload unusable, building heuristic meeting");
    vec![heuristic_meeting(original_message)]
}

/// Single-step schedule plan derived from the raw request text.
fn fallback_plan(message: &str) -> IntentPlan {
    IntentPlan {
        steps: vec![IntentStep::new(StepKind::Schedule, heuristic_title(message))],
    }
}

/// A meeting derived purely from the request text; the validator fills
/// in the default duration, date and time.
pub(crate) fn heuristic_meeting(message: &str) -> ExtractedMeeting {
    ExtractedMeeting { title: heuristic_title(message), ..ExtractedMeeting::default() }
}

/// Derive a meeting title from the raw request text.
fn heuristic_title(message: &str) -> String {
    let stripped = TITLE_PREFIX_RE.replace(message.trim(), "");
    let cleaned = stripped.trim().trim_end_matches(['.', '!', '?']).trim();
    if cleaned.is_empty() {
        "Meeting".to_string()
    } else {
        truncate_chars(cleaned, 100)
    }
}

/// Scan free text for plausible email addresses, deduplicated in
/// order of first appearance.
pub fn extract_emails(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for found in EMAIL_SCAN_RE.find_iter(text) {
        let email = found.as_str().to_string();
        if is_valid_email(&email) && !seen.contains(&email) {
            seen.push(email);
        }
    }
    seen
}
