//! Field validation helpers
//!
//! Small, dependency-light validators used by the intent validator and
//! the event writer. Kept here so both core services share identical
//! rules.

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of an RFC-plausible email address.
const MAX_EMAIL_LEN: usize = 254;

/// Loose RFC-plausibility check, deliberately not a full RFC 5322
/// grammar: one `@`, no whitespace, and a dotted domain.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Validate an email address for plausibility.
pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

/// Parse a zero-padded 24h `HH:MM` string.
pub fn parse_clock_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M").ok()
}

/// Truncate a string to at most `max_chars` characters, respecting
/// char boundaries.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("first.last+tag@sub.domain.co"));
    }

    #[test]
    fn rejects_implausible_emails() {
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("nodomain@host"));

        let oversized = format!("{}@example.com", "a".repeat(250));
        assert!(!is_valid_email(&oversized));
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(parse_clock_time("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_clock_time("17:00"), NaiveTime::from_hms_opt(17, 0, 0));
        assert!(parse_clock_time("25:00").is_none());
        assert!(parse_clock_time("9am").is_none());
    }

    #[test]
    fn truncates_on_char_boundaries() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 3), "hel");
        // Multi-byte characters must not be split.
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
