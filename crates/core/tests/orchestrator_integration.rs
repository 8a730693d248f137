//! End-to-end orchestrator runs against in-memory port fakes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use cadence_core::{
    CalendarGateway, Clock, EmailGateway, NluExtractor, PreferenceStore, WorkflowOrchestrator,
};
use cadence_domain::{
    CadenceError, CalendarEvent, EmailDraft, EventDraft, Preferences, PreferencesPatch, Result,
    SchedulingConfig, StepStatus, VersionedPreferences, WorkflowStatus,
};

// Monday, 08:00 UTC.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// NLU fake answering each prompt family with a canned response;
/// `None` simulates an outage for that call.
struct FakeNlu {
    plan: Option<String>,
    meetings: Option<String>,
    email_body: Option<String>,
}

impl FakeNlu {
    fn with_plan(plan: &str) -> Self {
        Self { plan: Some(plan.to_string()), meetings: None, email_body: None }
    }

    fn down() -> Self {
        Self { plan: None, meetings: None, email_body: None }
    }
}

#[async_trait]
impl NluExtractor for FakeNlu {
    async fn extract(&self, system: &str, _user: &str) -> Result<String> {
        let canned = if system.contains("ordered JSON plan") {
            &self.plan
        } else if system.contains("meeting the user wants") {
            &self.meetings
        } else {
            &self.email_body
        };
        canned.clone().ok_or_else(|| CadenceError::Network("nlu unreachable".into()))
    }
}

#[derive(Default)]
struct FakeCalendar {
    events: Vec<CalendarEvent>,
    inserted: Mutex<Vec<EventDraft>>,
    fail_titles: Vec<String>,
    fail_all: Option<CadenceError>,
    hang: bool,
}

#[async_trait]
impl CalendarGateway for FakeCalendar {
    async fn list_events(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        Ok(self.events.clone())
    }

    async fn insert_event(&self, draft: &EventDraft) -> Result<CalendarEvent> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        if let Some(error) = &self.fail_all {
            return Err(error.clone());
        }
        if self.fail_titles.iter().any(|t| t == &draft.title) {
            return Err(CadenceError::PermissionDenied("forbidden calendar".into()));
        }
        self.inserted.lock().push(draft.clone());
        Ok(CalendarEvent::new(draft.title.clone(), draft.start, draft.end, draft.timezone.clone()))
    }
}

#[derive(Default)]
struct FakeEmail {
    sent: Mutex<Vec<(Vec<String>, String, String)>>,
}

#[async_trait]
impl EmailGateway for FakeEmail {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<()> {
        self.sent.lock().push((to.to_vec(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

struct FakePrefs {
    state: Mutex<VersionedPreferences>,
    conflicts_remaining: AtomicU32,
}

impl FakePrefs {
    fn new() -> Self {
        Self {
            state: Mutex::new(VersionedPreferences {
                preferences: Preferences::default(),
                version: 1,
            }),
            conflicts_remaining: AtomicU32::new(0),
        }
    }

    fn conflicting_once() -> Self {
        let prefs = Self::new();
        prefs.conflicts_remaining.store(1, Ordering::SeqCst);
        prefs
    }
}

#[async_trait]
impl PreferenceStore for FakePrefs {
    async fn get(&self, _user_id: &str) -> Result<VersionedPreferences> {
        Ok(self.state.lock().clone())
    }

    async fn update(
        &self,
        _user_id: &str,
        expected_version: u64,
        patch: &PreferencesPatch,
    ) -> Result<VersionedPreferences> {
        if self.conflicts_remaining.load(Ordering::SeqCst) > 0 {
            self.conflicts_remaining.fetch_sub(1, Ordering::SeqCst);
            return Err(CadenceError::Conflict("concurrent preference write".into()));
        }
        let mut state = self.state.lock();
        if state.version != expected_version {
            return Err(CadenceError::Conflict("stale preference version".into()));
        }
        patch.apply_to(&mut state.preferences);
        state.version += 1;
        Ok(state.clone())
    }
}

struct Harness {
    calendar: Arc<FakeCalendar>,
    email: Arc<FakeEmail>,
    prefs: Arc<FakePrefs>,
    engine: WorkflowOrchestrator,
}

fn harness(nlu: FakeNlu, calendar: FakeCalendar, prefs: FakePrefs) -> Harness {
    harness_with_config(nlu, calendar, prefs, SchedulingConfig::default())
}

fn harness_with_config(
    nlu: FakeNlu,
    calendar: FakeCalendar,
    prefs: FakePrefs,
    config: SchedulingConfig,
) -> Harness {
    let calendar = Arc::new(calendar);
    let email = Arc::new(FakeEmail::default());
    let prefs = Arc::new(prefs);
    let engine = WorkflowOrchestrator::new(
        Arc::new(nlu),
        calendar.clone(),
        email.clone(),
        prefs.clone(),
        Arc::new(FixedClock(now())),
        &config,
    );
    Harness { calendar, email, prefs, engine }
}

#[tokio::test]
async fn schedule_then_email_continues_past_schedule_failure() {
    let plan = r#"{"steps": [
        {"type": "schedule", "description": "Book the sync",
         "params": {"title": "Sync", "date": "2025-06-03", "time": "10:00"}},
        {"type": "email", "description": "Status update",
         "params": {"recipients": ["dana@example.com"]}}
    ]}"#;
    let calendar = FakeCalendar {
        fail_all: Some(CadenceError::PermissionDenied("forbidden calendar".into())),
        ..FakeCalendar::default()
    };
    let h = harness(FakeNlu::with_plan(plan), calendar, FakePrefs::new());

    let response = h.engine.run("user-1", "book the sync and send a status update").await;

    assert_eq!(response.status, WorkflowStatus::Failed);
    assert_eq!(response.steps.len(), 2);
    assert_eq!(response.steps[0].status, StepStatus::Failed);
    assert!(response.steps[0].error.as_deref().unwrap().contains("Permission denied"));
    // The email step still ran and staged its draft.
    assert_eq!(response.steps[1].status, StepStatus::Completed);
    assert_eq!(response.suggested_actions.len(), 3);
    assert!(response.summary.contains('❌'));
    assert!(response.summary.contains("✉️"));
    // Nothing was ever sent.
    assert!(h.email.sent.lock().is_empty());
}

#[tokio::test]
async fn batch_schedule_reports_partial_failures_but_completes() {
    let plan = r#"{"steps": [
        {"type": "schedule", "description": "Book three meetings", "params": {"meetings": [
            {"title": "First", "date": "2025-06-03", "time": "09:00"},
            {"title": "Second", "date": "2025-06-03", "time": "10:00"},
            {"title": "Third", "date": "2025-06-03", "time": "11:00"}
        ]}}
    ]}"#;
    let calendar = FakeCalendar { fail_titles: vec!["Second".into()], ..FakeCalendar::default() };
    let h = harness(FakeNlu::with_plan(plan), calendar, FakePrefs::new());

    let response = h.engine.run("user-1", "book my three meetings").await;

    assert_eq!(response.status, WorkflowStatus::Completed);
    assert_eq!(response.steps[0].status, StepStatus::Completed);

    let inserted = h.calendar.inserted.lock();
    let titles: Vec<&str> = inserted.iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Third"]);

    let result = response.steps[0].result.as_ref().unwrap();
    assert_eq!(result["created"].as_array().unwrap().len(), 2);
    assert_eq!(result["failed"][0]["title"], "Second");
    assert!(response.summary.contains("(1 failed)"));
}

#[tokio::test]
async fn nlu_outage_degrades_to_heuristic_schedule_plan() {
    let h = harness(FakeNlu::down(), FakeCalendar::default(), FakePrefs::new());

    let response = h.engine.run("user-1", "schedule a meeting with the design team").await;

    assert_eq!(response.status, WorkflowStatus::Completed);
    assert_eq!(response.steps.len(), 1);
    let inserted = h.calendar.inserted.lock();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].title, "the design team");
    // Heuristics default to tomorrow at the working-hours start.
    assert_eq!(inserted[0].start, Utc.with_ymd_and_hms(2025, 6, 3, 9, 0, 0).unwrap());
}

#[tokio::test]
async fn email_step_stages_draft_and_extracts_recipients() {
    let plan = r#"{"steps": [
        {"type": "email", "description": "Share the notes", "params": {}}
    ]}"#;
    let mut nlu = FakeNlu::with_plan(plan);
    nlu.email_body = Some("Hi Dana, notes attached.".to_string());
    let h = harness(nlu, FakeCalendar::default(), FakePrefs::new());

    let response = h.engine.run("user-1", "email the notes to dana@example.com").await;

    assert_eq!(response.status, WorkflowStatus::Completed);
    let result = response.steps[0].result.as_ref().unwrap();
    assert_eq!(result["draft"]["to"][0], "dana@example.com");
    assert_eq!(result["draft"]["body"], "Hi Dana, notes attached.");
    assert_eq!(response.suggested_actions.len(), 3);
    assert!(h.email.sent.lock().is_empty());
}

#[tokio::test]
async fn preference_update_survives_one_version_conflict() {
    let plan = r#"{"steps": [
        {"type": "update_preferences", "description": "Block lunch", "params": {}}
    ]}"#;
    let h = harness(
        FakeNlu::with_plan(plan),
        FakeCalendar::default(),
        FakePrefs::conflicting_once(),
    );

    let response = h.engine.run("user-1", "block my lunch from 12:00 to 13:00").await;

    assert_eq!(response.status, WorkflowStatus::Completed);
    let state = h.prefs.state.lock();
    assert_eq!(state.version, 2);
    assert_eq!(state.preferences.protected_rules.len(), 1);
    assert_eq!(state.preferences.protected_rules[0].start, "12:00");
    assert!(response.summary.contains("🛡️"));
}

#[tokio::test]
async fn vague_preference_request_is_acknowledged_not_failed() {
    let plan = r#"{"steps": [
        {"type": "update_preferences", "description": "Calmer calendar", "params": {}}
    ]}"#;
    let h = harness(FakeNlu::with_plan(plan), FakeCalendar::default(), FakePrefs::new());

    let response = h.engine.run("user-1", "please keep my calendar calmer").await;

    assert_eq!(response.status, WorkflowStatus::Completed);
    assert_eq!(response.steps[0].result.as_ref().unwrap()["acknowledged"], true);
    // Nothing was written.
    assert_eq!(h.prefs.state.lock().version, 1);
}

#[tokio::test]
async fn malformed_rule_params_never_reach_the_store_or_break_analysis() {
    let plan = r#"{"steps": [
        {"type": "update_preferences", "description": "Protect mornings",
         "params": {"add_protected_rules": [
            {"label": "Bad", "start": "abc", "end": "abd", "days_of_week": [1]}
         ]}},
        {"type": "analyze", "description": "Check today", "params": {}}
    ]}"#;
    let h = harness(FakeNlu::with_plan(plan), FakeCalendar::default(), FakePrefs::new());

    let response = h.engine.run("user-1", "protect my mornings, then check my day").await;

    // The garbage rule is dropped, the step degrades to an
    // acknowledgement, and the day view still works.
    assert_eq!(response.status, WorkflowStatus::Completed);
    assert_eq!(response.steps[0].status, StepStatus::Completed);
    assert_eq!(response.steps[0].result.as_ref().unwrap()["acknowledged"], true);
    assert_eq!(response.steps[1].status, StepStatus::Completed);

    let state = h.prefs.state.lock();
    assert_eq!(state.version, 1);
    assert!(state.preferences.protected_rules.is_empty());
}

#[tokio::test]
async fn analyze_step_summarizes_the_day() {
    let plan = r#"{"steps": [
        {"type": "analyze", "description": "Check today", "params": {}}
    ]}"#;
    let meeting = CalendarEvent::new(
        "Standup",
        Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap(),
        "UTC",
    );
    let calendar = FakeCalendar { events: vec![meeting], ..FakeCalendar::default() };
    let h = harness(FakeNlu::with_plan(plan), calendar, FakePrefs::new());

    let response = h.engine.run("user-1", "how busy am I today").await;

    assert_eq!(response.status, WorkflowStatus::Completed);
    let result = response.steps[0].result.as_ref().unwrap();
    assert_eq!(result["event_count"], 1);
    assert_eq!(result["stats"]["meeting_minutes"], 60);
    assert!(response.summary.contains("🔍"));
}

#[tokio::test]
async fn hanging_step_times_out_and_later_steps_still_run() {
    let plan = r#"{"steps": [
        {"type": "schedule", "description": "Book the sync",
         "params": {"title": "Sync", "date": "2025-06-03", "time": "10:00"}},
        {"type": "email", "description": "Status update",
         "params": {"recipients": ["dana@example.com"]}}
    ]}"#;
    let calendar = FakeCalendar { hang: true, ..FakeCalendar::default() };
    let config = SchedulingConfig { step_deadline_secs: 1, ..SchedulingConfig::default() };
    let h = harness_with_config(FakeNlu::with_plan(plan), calendar, FakePrefs::new(), config);

    tokio::time::pause();
    let response = h.engine.run("user-1", "book the sync and send an update").await;

    assert_eq!(response.status, WorkflowStatus::Failed);
    assert_eq!(response.steps[0].status, StepStatus::Failed);
    assert!(response.steps[0].error.as_deref().unwrap().contains("deadline"));
    assert_eq!(response.steps[1].status, StepStatus::Completed);
}

#[tokio::test]
async fn send_draft_delivers_through_the_gateway() {
    let h = harness(FakeNlu::down(), FakeCalendar::default(), FakePrefs::new());
    let draft = EmailDraft {
        to: vec!["dana@example.com".into()],
        subject: "Notes".into(),
        body: "Attached.".into(),
    };

    h.engine.send_draft(&draft).await.unwrap();
    assert_eq!(h.email.sent.lock().len(), 1);

    let empty = EmailDraft { to: Vec::new(), subject: "Notes".into(), body: "body".into() };
    assert!(matches!(
        h.engine.send_draft(&empty).await,
        Err(CadenceError::Validation(_))
    ));
}
