//! Intent plan types
//!
//! An [`IntentPlan`] is the validated, structured representation of one
//! or more requested actions derived from free-text input. The raw NLU
//! response is an untrusted payload; these types use lenient serde
//! defaults so that partially-formed JSON still deserializes, and the
//! parser in `cadence-core` applies the real validation afterwards.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The kind of action a step requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Schedule,
    Email,
    UpdatePreferences,
    Analyze,
}

/// One requested action inside a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentStep {
    #[serde(rename = "type")]
    pub kind: StepKind,
    #[serde(default)]
    pub description: String,
    /// Free-form parameters; contents depend on the step kind and are
    /// validated at execution time, never trusted at parse time.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl IntentStep {
    pub fn new(kind: StepKind, description: impl Into<String>) -> Self {
        Self { kind, description: description.into(), params: Map::new() }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// A validated multi-step plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentPlan {
    pub steps: Vec<IntentStep>,
}

/// A meeting as extracted by the NLU service, before validation.
///
/// All fields are optional or defaulted because the upstream model
/// offers no schema guarantee. The validator clamps the duration to
/// [15, 480] minutes, truncates the title, checks date/time formats
/// and drops implausible attendee emails.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedMeeting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration_minutes: Option<i64>,
    /// `YYYY-MM-DD`, if the model supplied one.
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM`, if the model supplied one.
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_meeting_tolerates_missing_fields() {
        let meeting: ExtractedMeeting = serde_json::from_str(r#"{"title": "Sync"}"#).unwrap();
        assert_eq!(meeting.title, "Sync");
        assert!(meeting.duration_minutes.is_none());
        assert!(meeting.attendees.is_empty());
    }

    #[test]
    fn step_kind_uses_snake_case() {
        let step: IntentStep =
            serde_json::from_str(r#"{"type": "update_preferences", "description": "block lunch"}"#)
                .unwrap();
        assert_eq!(step.kind, StepKind::UpdatePreferences);
    }
}
