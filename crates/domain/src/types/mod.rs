//! Domain types and models

pub mod event;
pub mod intent;
pub mod preferences;
pub mod schedule;
pub mod workflow;

pub use event::{Attendee, CalendarEvent, EventCategory, EventDraft};
pub use intent::{ExtractedMeeting, IntentPlan, IntentStep, StepKind};
pub use preferences::{Preferences, PreferencesPatch, VersionedPreferences};
pub use schedule::{DaySchedule, ProtectedTimeRule, ScheduleStats, TimeSlot, WorkingHours};
pub use workflow::{
    EmailDraft, StepStatus, SuggestedAction, WorkflowResponse, WorkflowStatus, WorkflowStep,
};
