//! User preference types
//!
//! Preferences are read, amended, and written back by the workflow
//! engine. The store uses an optimistic-concurrency version token so
//! that two concurrent read-modify-write cycles cannot silently drop
//! an update; a stale writer gets a `Conflict` error instead.

use serde::{Deserialize, Serialize};

use super::schedule::{ProtectedTimeRule, WorkingHours};

/// A user's scheduling preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub working_hours: WorkingHours,
    /// IANA timezone name, e.g. "America/New_York".
    pub timezone: String,
    #[serde(default)]
    pub protected_rules: Vec<ProtectedTimeRule>,
    #[serde(default = "default_meeting_minutes")]
    pub default_meeting_minutes: u32,
}

fn default_meeting_minutes() -> u32 {
    30
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            working_hours: WorkingHours::default(),
            timezone: "UTC".to_string(),
            protected_rules: Vec::new(),
            default_meeting_minutes: 30,
        }
    }
}

/// Preferences together with their store version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionedPreferences {
    pub preferences: Preferences,
    /// Monotonic version; `update` must present the version it read.
    pub version: u64,
}

/// A partial update to preferences.
///
/// `None` fields are left untouched; `add_protected_rules` appends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreferencesPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_hours: Option<WorkingHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(default)]
    pub add_protected_rules: Vec<ProtectedTimeRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_meeting_minutes: Option<u32>,
}

impl PreferencesPatch {
    /// Apply this patch to a preferences document.
    pub fn apply_to(&self, prefs: &mut Preferences) {
        if let Some(ref hours) = self.working_hours {
            prefs.working_hours = hours.clone();
        }
        if let Some(ref tz) = self.timezone {
            prefs.timezone = tz.clone();
        }
        for rule in &self.add_protected_rules {
            if !prefs.protected_rules.contains(rule) {
                prefs.protected_rules.push(rule.clone());
            }
        }
        if let Some(minutes) = self.default_meeting_minutes {
            prefs.default_meeting_minutes = minutes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_appends_rules_without_duplicates() {
        let mut prefs = Preferences::default();
        let rule = ProtectedTimeRule {
            label: "Lunch".into(),
            start: "12:00".into(),
            end: "13:00".into(),
            days_of_week: vec![1, 2, 3, 4, 5],
        };

        let patch = PreferencesPatch {
            add_protected_rules: vec![rule.clone(), rule.clone()],
            ..Default::default()
        };
        patch.apply_to(&mut prefs);
        assert_eq!(prefs.protected_rules.len(), 1);

        patch.apply_to(&mut prefs);
        assert_eq!(prefs.protected_rules.len(), 1);
    }

    #[test]
    fn patch_leaves_unset_fields_alone() {
        let mut prefs = Preferences::default();
        let patch = PreferencesPatch { timezone: Some("Europe/Berlin".into()), ..Default::default() };
        patch.apply_to(&mut prefs);

        assert_eq!(prefs.timezone, "Europe/Berlin");
        assert_eq!(prefs.working_hours, WorkingHours::default());
    }
}
