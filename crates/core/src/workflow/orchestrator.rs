//! The multi-step workflow orchestrator
//!
//! One free-text request becomes an intent plan; the orchestrator runs
//! the plan's steps strictly in order. Failure handling is the whole
//! point of this module: a failed or timed-out step is recorded on its
//! own record and the remaining steps still run, so the caller always
//! gets a complete per-step picture instead of the first error.
//!
//! Email steps never send anything. They stage a draft and surface
//! send/enhance/edit affordances; delivery happens only through
//! [`WorkflowOrchestrator::send_draft`] on an explicit confirmation.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{info, warn};

use cadence_domain::{
    CadenceError, EmailDraft, ExtractedMeeting, IntentPlan, IntentStep, Preferences,
    PreferencesPatch, ProtectedTimeRule, Result, SchedulingConfig, StepKind, StepStatus,
    SuggestedAction, VersionedPreferences, WorkflowResponse, WorkflowStatus, WorkflowStep,
};

use crate::intent::meeting::mentioned_date;
use crate::intent::{
    extract_emails, parse_extracted_meetings, parse_intent_plan, validate_meeting,
};
use crate::scheduling::EventWriter;
use crate::views::ScheduleService;
use crate::workflow::ports::{
    CalendarGateway, Clock, EmailGateway, NluExtractor, PreferenceStore,
};

const PLAN_PROMPT: &str = "Break the user's request into an ordered JSON plan. Respond with \
{\"steps\": [{\"type\": \"schedule\"|\"email\"|\"update_preferences\"|\"analyze\", \
\"description\": string, \"params\": object}]} and nothing else.";

const EXTRACT_PROMPT: &str = "Extract every meeting the user wants created. Respond with \
{\"meetings\": [{\"title\": string, \"duration_minutes\": number, \"date\": \"YYYY-MM-DD\", \
\"time\": \"HH:MM\", \"attendees\": [string]}]} and nothing else.";

const EMAIL_PROMPT: &str = "Write a short, professional email body for the user's request. \
Respond with the body text only, no subject line and no commentary.";

/// `HH:MM to HH:MM` style range inside a preference request.
static TIME_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(\d{1,2}):(\d{2})\s*(?:to|until|through|-|\u{2013})\s*(\d{1,2}):(\d{2})")
        .expect("time range regex is valid")
});

/// What one successfully executed step hands back to the run loop.
struct StepOutput {
    result: Value,
    summary_line: String,
    draft: Option<EmailDraft>,
}

impl StepOutput {
    fn new(result: Value, summary_line: impl Into<String>) -> Self {
        Self { result, summary_line: summary_line.into(), draft: None }
    }
}

/// Executes intent plans against the injected ports.
pub struct WorkflowOrchestrator {
    nlu: Arc<dyn NluExtractor>,
    email: Arc<dyn EmailGateway>,
    preferences: Arc<dyn PreferenceStore>,
    clock: Arc<dyn Clock>,
    writer: EventWriter,
    views: ScheduleService,
    step_deadline: StdDuration,
}

impl WorkflowOrchestrator {
    pub fn new(
        nlu: Arc<dyn NluExtractor>,
        calendar: Arc<dyn CalendarGateway>,
        email: Arc<dyn EmailGateway>,
        preferences: Arc<dyn PreferenceStore>,
        clock: Arc<dyn Clock>,
        config: &SchedulingConfig,
    ) -> Self {
        let writer =
            EventWriter::with_max_attempts(calendar.clone(), clock.clone(), config.max_attempts);
        Self {
            nlu,
            email,
            preferences,
            clock,
            writer,
            views: ScheduleService::new(calendar),
            step_deadline: StdDuration::from_secs(config.step_deadline_secs),
        }
    }

    /// Derive an intent plan from the raw request text.
    ///
    /// Infallible by design: an NLU outage degrades to the heuristic
    /// single-step schedule plan.
    pub async fn plan_from_message(&self, message: &str) -> IntentPlan {
        match self.nlu.extract(PLAN_PROMPT, message).await {
            Ok(raw) => parse_intent_plan(&raw, message),
            Err(error) => {
                warn!(%error, "plan extraction unavailable, using heuristic plan");
                parse_intent_plan("", message)
            }
        }
    }

    /// Run the full workflow for one request.
    pub async fn run(&self, user_id: &str, message: &str) -> WorkflowResponse {
        let mut prefs = match self.preferences.get(user_id).await {
            Ok(versioned) => versioned,
            Err(error) => {
                warn!(%error, user_id, "preference load failed, using defaults");
                VersionedPreferences { preferences: Preferences::default(), version: 0 }
            }
        };
        let tz = prefs.preferences.timezone.parse::<Tz>().unwrap_or(chrono_tz::UTC);
        let today = self.clock.today_in(tz);

        let plan = self.plan_from_message(message).await;
        info!(user_id, steps = plan.steps.len(), "executing workflow plan");

        let mut steps: Vec<WorkflowStep> = Vec::with_capacity(plan.steps.len());
        let mut summary_lines: Vec<String> = Vec::new();
        let mut pending_draft: Option<EmailDraft> = None;

        for intent in &plan.steps {
            let mut record = WorkflowStep::pending(intent.kind, intent.description.clone());
            record.mark_in_progress();

            let outcome = tokio::time::timeout(
                self.step_deadline,
                self.execute_step(intent, message, user_id, &mut prefs, today),
            )
            .await;

            match outcome {
                Ok(Ok(output)) => {
                    record.mark_completed(output.result);
                    summary_lines.push(output.summary_line);
                    if output.draft.is_some() {
                        pending_draft = output.draft;
                    }
                }
                Ok(Err(error)) => {
                    warn!(%error, kind = ?intent.kind, "workflow step failed");
                    summary_lines.push(format!("❌ {}: {error}", step_label(intent)));
                    record.mark_failed(error.to_string());
                }
                Err(_elapsed) => {
                    let reason = format!(
                        "step exceeded its {}s deadline",
                        self.step_deadline.as_secs()
                    );
                    warn!(kind = ?intent.kind, "workflow step timed out");
                    summary_lines.push(format!("❌ {}: {reason}", step_label(intent)));
                    record.mark_failed(reason);
                }
            }
            steps.push(record);
        }

        let status = if steps.iter().all(|s| s.status == StepStatus::Completed) {
            WorkflowStatus::Completed
        } else {
            WorkflowStatus::Failed
        };

        let suggested_actions = pending_draft
            .map(|draft| {
                vec![
                    SuggestedAction::SendNow { draft: draft.clone() },
                    SuggestedAction::Enhance { draft: draft.clone() },
                    SuggestedAction::EditDraft { draft },
                ]
            })
            .unwrap_or_default();

        WorkflowResponse { summary: summary_lines.join("\n"), status, steps, suggested_actions }
    }

    /// Deliver a previously staged draft after the user confirmed it.
    pub async fn send_draft(&self, draft: &EmailDraft) -> Result<()> {
        if draft.to.is_empty() {
            return Err(CadenceError::Validation("draft has no recipients".into()));
        }
        self.email.send(&draft.to, &draft.subject, &draft.body).await?;
        info!(recipients = draft.to.len(), "email draft sent");
        Ok(())
    }

    async fn execute_step(
        &self,
        intent: &IntentStep,
        message: &str,
        user_id: &str,
        prefs: &mut VersionedPreferences,
        today: NaiveDate,
    ) -> Result<StepOutput> {
        match intent.kind {
            StepKind::Schedule => {
                self.run_schedule_step(intent, message, &prefs.preferences, today).await
            }
            StepKind::Email => self.run_email_step(intent, message).await,
            StepKind::UpdatePreferences => {
                self.run_preferences_step(intent, message, user_id, prefs).await
            }
            StepKind::Analyze => self.run_analyze_step(message, &prefs.preferences, today).await,
        }
    }

    /// Create the requested meetings.
    ///
    /// Meeting data comes from the plan params when the planner
    /// supplied it, otherwise from a dedicated extraction call. The
    /// step only fails when nothing at all could be created.
    async fn run_schedule_step(
        &self,
        intent: &IntentStep,
        message: &str,
        prefs: &Preferences,
        today: NaiveDate,
    ) -> Result<StepOutput> {
        let raw_meetings = self.gather_meetings(intent, message).await;

        let mut drafts = Vec::new();
        let mut failed: Vec<(String, CadenceError)> = Vec::new();
        for raw in raw_meetings {
            let validated = validate_meeting(raw, message, prefs, today);
            match validated.to_draft(&prefs.timezone) {
                Ok(draft) => drafts.push(draft),
                Err(error) => failed.push((validated.title, error)),
            }
        }

        let batch = self.writer.create_batch(&drafts).await;
        failed.extend(batch.failed.into_iter().map(|f| (f.title, f.error)));

        if batch.created.is_empty() {
            if let Some((_, error)) = failed.into_iter().next() {
                return Err(error);
            }
            return Err(CadenceError::Validation(
                "no meetings could be derived from the request".into(),
            ));
        }

        let titles: Vec<&str> = batch.created.iter().map(|e| e.title.as_str()).collect();
        let mut line = format!(
            "📅 Created {} meeting{}: {}",
            batch.created.len(),
            if batch.created.len() == 1 { "" } else { "s" },
            titles.join(", ")
        );
        if !failed.is_empty() {
            line.push_str(&format!(" ({} failed)", failed.len()));
        }

        let result = json!({
            "created": batch.created.iter().map(|e| json!({
                "id": e.id,
                "title": e.title,
                "start": e.start,
                "end": e.end,
            })).collect::<Vec<_>>(),
            "failed": failed.iter().map(|(title, error)| json!({
                "title": title,
                "error": error.to_string(),
            })).collect::<Vec<_>>(),
        });
        Ok(StepOutput::new(result, line))
    }

    /// Collect raw meetings for a schedule step, in order of trust:
    /// explicit `meetings` params, the params object itself as a single
    /// meeting, then a fresh extraction call.
    async fn gather_meetings(&self, intent: &IntentStep, message: &str) -> Vec<ExtractedMeeting> {
        if let Some(items) = intent.params.get("meetings").and_then(Value::as_array) {
            let meetings: Vec<ExtractedMeeting> = items
                .iter()
                .filter_map(|item| serde_json::from_value(item.clone()).ok())
                .collect();
            if !meetings.is_empty() {
                return meetings;
            }
        }

        if intent.params.contains_key("title") {
            if let Ok(meeting) = serde_json::from_value::<ExtractedMeeting>(Value::Object(
                intent.params.clone(),
            )) {
                return vec![meeting];
            }
        }

        match self.nlu.extract(EXTRACT_PROMPT, message).await {
            Ok(raw) => parse_extracted_meetings(&raw, message),
            Err(error) => {
                warn!(%error, "meeting extraction unavailable, using heuristic meeting");
                parse_extracted_meetings("", message)
            }
        }
    }

    /// Stage an email draft; no mail leaves through this path.
    async fn run_email_step(&self, intent: &IntentStep, message: &str) -> Result<StepOutput> {
        let mut recipients: Vec<String> = Vec::new();
        for key in ["recipients", "to"] {
            if let Some(items) = intent.params.get(key).and_then(Value::as_array) {
                for item in items {
                    if let Some(email) = item.as_str() {
                        let email = email.trim().to_string();
                        if cadence_common::is_valid_email(&email)
                            && !recipients.contains(&email)
                        {
                            recipients.push(email);
                        }
                    }
                }
            }
        }
        for email in extract_emails(message) {
            if !recipients.contains(&email) {
                recipients.push(email);
            }
        }

        let subject = intent
            .params
            .get("subject")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if intent.description.trim().is_empty() {
                    "Follow-up".to_string()
                } else {
                    intent.description.trim().to_string()
                }
            });

        let body = match self.nlu.extract(EMAIL_PROMPT, message).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) | Err(_) => {
                format!("Hi,\n\nFollowing up on this request:\n\n{message}\n\nBest regards")
            }
        };

        let draft = EmailDraft { to: recipients, subject, body };
        let line = if draft.to.is_empty() {
            "✉️ Drafted an email (add recipients before sending)".to_string()
        } else {
            format!("✉️ Drafted an email to {} (awaiting your confirmation)", draft.to.join(", "))
        };

        let mut output = StepOutput::new(json!({ "draft": draft }), line);
        output.draft = Some(draft);
        Ok(output)
    }

    /// Apply a preference change with one compare-and-swap retry.
    ///
    /// This step degrades rather than fails: when no concrete change
    /// can be derived or the store keeps rejecting the write, the user
    /// gets a generic acknowledgment and the workflow carries on.
    async fn run_preferences_step(
        &self,
        intent: &IntentStep,
        message: &str,
        user_id: &str,
        prefs: &mut VersionedPreferences,
    ) -> Result<StepOutput> {
        let Some(patch) = derive_patch(intent, message) else {
            return Ok(StepOutput::new(
                json!({ "acknowledged": true }),
                "🛡️ Noted your preference",
            ));
        };

        let mut attempt = self
            .preferences
            .update(user_id, prefs.version, &patch)
            .await;

        if matches!(attempt, Err(CadenceError::Conflict(_))) {
            // Someone else wrote in between; re-read and try once more.
            if let Ok(fresh) = self.preferences.get(user_id).await {
                *prefs = fresh;
                attempt = self.preferences.update(user_id, prefs.version, &patch).await;
            }
        }

        match attempt {
            Ok(updated) => {
                let version = updated.version;
                *prefs = updated;
                Ok(StepOutput::new(
                    json!({ "updated": true, "version": version }),
                    "🛡️ Updated your scheduling preferences",
                ))
            }
            Err(error) => {
                warn!(%error, user_id, "preference update failed, acknowledging only");
                Ok(StepOutput::new(
                    json!({ "acknowledged": true, "applied": false }),
                    "🛡️ Noted your preference",
                ))
            }
        }
    }

    /// Summarize one day of the calendar.
    async fn run_analyze_step(
        &self,
        message: &str,
        prefs: &Preferences,
        today: NaiveDate,
    ) -> Result<StepOutput> {
        let date = mentioned_date(message, today).unwrap_or(today);
        let view = self.views.day_view(date, prefs).await?;

        let line = format!(
            "🔍 {date}: {} event{}, {}m in meetings, {}m free",
            view.events.len(),
            if view.events.len() == 1 { "" } else { "s" },
            view.stats.meeting_minutes,
            view.stats.available_minutes,
        );
        let result = json!({
            "date": date,
            "event_count": view.events.len(),
            "stats": view.stats,
            "available_slots": view.available_slots,
        });
        Ok(StepOutput::new(result, line))
    }
}

/// Short human label for a step in the summary text.
fn step_label(intent: &IntentStep) -> &str {
    if intent.description.trim().is_empty() {
        match intent.kind {
            StepKind::Schedule => "Schedule meetings",
            StepKind::Email => "Draft email",
            StepKind::UpdatePreferences => "Update preferences",
            StepKind::Analyze => "Analyze schedule",
        }
    } else {
        intent.description.trim()
    }
}

/// Derive a concrete patch from step params or the request text.
///
/// Params come straight out of model output, so every field is
/// screened before it can reach the store; a patch with nothing left
/// after screening falls through to the message scan.
fn derive_patch(intent: &IntentStep, message: &str) -> Option<PreferencesPatch> {
    if !intent.params.is_empty() {
        if let Ok(mut patch) =
            serde_json::from_value::<PreferencesPatch>(Value::Object(intent.params.clone()))
        {
            sanitize_patch(&mut patch);
            if !patch_is_empty(&patch) {
                return Some(patch);
            }
        }
    }

    rule_from_message(intent, message).map(|rule| PreferencesPatch {
        add_protected_rules: vec![rule],
        ..PreferencesPatch::default()
    })
}

/// Drop patch fields that fail validation.
fn sanitize_patch(patch: &mut PreferencesPatch) {
    patch.add_protected_rules.retain(|rule| {
        let keep = rule.is_valid();
        if !keep {
            warn!(label = %rule.label, "dropping malformed protected rule from step params");
        }
        keep
    });

    if let Some(hours) = &patch.working_hours {
        let well_formed = cadence_common::parse_clock_time(&hours.start)
            .zip(cadence_common::parse_clock_time(&hours.end))
            .is_some_and(|(start, end)| start < end);
        if !well_formed {
            warn!(start = %hours.start, end = %hours.end, "dropping malformed working hours from step params");
            patch.working_hours = None;
        }
    }

    if let Some(timezone) = &patch.timezone {
        if timezone.parse::<Tz>().is_err() {
            warn!(%timezone, "dropping unknown timezone from step params");
            patch.timezone = None;
        }
    }
}

fn patch_is_empty(patch: &PreferencesPatch) -> bool {
    patch.working_hours.is_none()
        && patch.timezone.is_none()
        && patch.add_protected_rules.is_empty()
        && patch.default_meeting_minutes.is_none()
}

/// Pull a protected-time rule out of free text, weekdays by default.
fn rule_from_message(intent: &IntentStep, message: &str) -> Option<ProtectedTimeRule> {
    let captures = TIME_RANGE_RE.captures(message)?;
    let start = format!("{:0>2}:{}", &captures[1], &captures[2]);
    let end = format!("{:0>2}:{}", &captures[3], &captures[4]);

    let label = if intent.description.trim().is_empty() {
        "Protected time".to_string()
    } else {
        intent.description.trim().to_string()
    };
    let rule = ProtectedTimeRule { label, start, end, days_of_week: vec![1, 2, 3, 4, 5] };
    rule.is_valid().then_some(rule)
}
