//! Validated, retrying event creation
//!
//! The writer is the single path through which new events reach the
//! calendar provider. Drafts are normalized and validated first so the
//! provider is never asked to persist garbage, then the insert is
//! retried with exponential backoff. Authorization and rate-limit
//! failures stop immediately; retrying them only burns quota.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use tracing::{info, warn};

use cadence_common::{
    is_valid_email, BackoffStrategy, RetryConfig, RetryDecision, RetryError, RetryExecutor,
};
use cadence_domain::{CadenceError, CalendarEvent, EventDraft, Result};

use crate::workflow::ports::{CalendarGateway, Clock};

const MAX_TITLE_CHARS: usize = 1000;
const MAX_EVENT_HOURS: i64 = 8;

/// Outcome of a batch creation request.
///
/// Each draft is attempted independently; one failure never aborts the
/// rest of the batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub created: Vec<CalendarEvent>,
    pub failed: Vec<BatchFailure>,
}

/// One draft that could not be created, with the error that stopped it.
#[derive(Debug)]
pub struct BatchFailure {
    pub title: String,
    pub error: CadenceError,
}

/// Creates calendar events through a [`CalendarGateway`] with
/// validation, normalization and bounded retry.
pub struct EventWriter {
    gateway: Arc<dyn CalendarGateway>,
    clock: Arc<dyn Clock>,
    retry: RetryConfig,
}

impl EventWriter {
    pub fn new(gateway: Arc<dyn CalendarGateway>, clock: Arc<dyn Clock>) -> Self {
        Self::with_max_attempts(gateway, clock, 3)
    }

    /// `max_attempts` counts the initial try, so 3 means two retries.
    pub fn with_max_attempts(
        gateway: Arc<dyn CalendarGateway>,
        clock: Arc<dyn Clock>,
        max_attempts: u32,
    ) -> Self {
        let retry = RetryConfig::new(
            max_attempts,
            BackoffStrategy::Exponential {
                initial_delay: StdDuration::from_millis(1000),
                base: 2.0,
                max_delay: StdDuration::from_secs(10),
            },
        );
        Self { gateway, clock, retry }
    }

    /// Validate, normalize and create one event.
    pub async fn create(&self, draft: &EventDraft) -> Result<CalendarEvent> {
        let normalized = self.normalize(draft)?;

        let policy = |error: &CadenceError, _attempt: u32| match error {
            CadenceError::PermissionDenied(_) | CadenceError::RateLimited(_) => {
                RetryDecision::Stop
            }
            _ => RetryDecision::Retry,
        };
        let executor = RetryExecutor::new(self.retry.clone(), policy);

        let outcome = executor
            .execute_with_outcome(|| {
                let draft = normalized.clone();
                async move { self.gateway.insert_event(&draft).await }
            })
            .await;

        match outcome.result {
            Ok(event) => {
                info!(event_id = %event.id, title = %event.title, "event created");
                Ok(event)
            }
            Err(RetryError::NonRetryable { source }) => Err(source),
            Err(RetryError::AttemptsExhausted { attempts }) => {
                let last = outcome.last_error.unwrap_or_else(|| "unknown error".to_string());
                Err(CadenceError::Provider(format!(
                    "event creation failed after {attempts} attempts: {last}"
                )))
            }
        }
    }

    /// Create a batch of drafts sequentially.
    ///
    /// Attempts are independent: failures are collected per draft and
    /// the remaining drafts still run.
    pub async fn create_batch(&self, drafts: &[EventDraft]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for draft in drafts {
            match self.create(draft).await {
                Ok(event) => outcome.created.push(event),
                Err(error) => {
                    warn!(title = %draft.title, %error, "batch event creation failed");
                    outcome.failed.push(BatchFailure { title: draft.title.clone(), error });
                }
            }
        }
        outcome
    }

    /// Apply the validation and normalization rules to a draft.
    fn normalize(&self, draft: &EventDraft) -> Result<EventDraft> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(CadenceError::Validation("event title must not be empty".into()));
        }
        let title = cadence_common::truncate_chars(title, MAX_TITLE_CHARS);

        if draft.start >= draft.end {
            return Err(CadenceError::Validation(format!(
                "event start {} must be before end {}",
                draft.start, draft.end
            )));
        }
        if draft.duration() > Duration::hours(MAX_EVENT_HOURS) {
            return Err(CadenceError::Validation(format!(
                "event duration {}m exceeds the {MAX_EVENT_HOURS} hour limit",
                draft.duration().num_minutes()
            )));
        }

        let mut attendees: Vec<String> = Vec::new();
        for attendee in &draft.attendees {
            let email = attendee.trim();
            if !is_valid_email(email) {
                return Err(CadenceError::Validation(format!(
                    "invalid attendee email: {email}"
                )));
            }
            if !attendees.iter().any(|existing| existing == email) {
                attendees.push(email.to_string());
            }
        }

        let mut normalized = draft.clone();
        normalized.title = title;
        normalized.attendees = attendees;

        // A start in the past almost always means the date heuristics
        // resolved to earlier today; push the whole event to the same
        // time tomorrow rather than failing.
        if normalized.start < self.clock.now() {
            warn!(title = %normalized.title, start = %normalized.start, "shifting past-dated event forward one day");
            normalized.start += Duration::days(1);
            normalized.end += Duration::days(1);
        }

        Ok(normalized)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use parking_lot::Mutex;

    use super::*;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Gateway fake that fails a scripted number of times before
    /// succeeding, or always fails with a given error.
    struct ScriptedGateway {
        failures: AtomicU32,
        error: CadenceError,
        inserted: Mutex<Vec<EventDraft>>,
    }

    impl ScriptedGateway {
        fn failing_times(n: u32, error: CadenceError) -> Self {
            Self { failures: AtomicU32::new(n), error, inserted: Mutex::new(Vec::new()) }
        }

        fn ok() -> Self {
            Self::failing_times(0, CadenceError::Internal("unused".into()))
        }
    }

    #[async_trait]
    impl CalendarGateway for ScriptedGateway {
        async fn list_events(
            &self,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }

        async fn insert_event(&self, draft: &EventDraft) -> Result<CalendarEvent> {
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(self.error.clone());
            }
            self.inserted.lock().push(draft.clone());
            Ok(CalendarEvent::new(
                draft.title.clone(),
                draft.start,
                draft.end,
                draft.timezone.clone(),
            ))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap()
    }

    fn draft(title: &str, start_hour: u32, end_hour: u32) -> EventDraft {
        EventDraft::new(
            title,
            Utc.with_ymd_and_hms(2025, 6, 2, start_hour, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 6, 2, end_hour, 0, 0).unwrap(),
            "UTC",
        )
    }

    fn writer(gateway: Arc<ScriptedGateway>) -> EventWriter {
        EventWriter::new(gateway, Arc::new(FixedClock(now())))
    }

    #[tokio::test]
    async fn creates_valid_event() {
        let gateway = Arc::new(ScriptedGateway::ok());
        let event = writer(gateway.clone()).create(&draft("Sync", 10, 11)).await.unwrap();

        assert_eq!(event.title, "Sync");
        assert_eq!(gateway.inserted.lock().len(), 1);
    }

    #[tokio::test]
    async fn rejects_empty_title_without_calling_gateway() {
        let gateway = Arc::new(ScriptedGateway::ok());
        let result = writer(gateway.clone()).create(&draft("   ", 10, 11)).await;

        assert!(matches!(result, Err(CadenceError::Validation(_))));
        assert!(gateway.inserted.lock().is_empty());
    }

    #[tokio::test]
    async fn rejects_inverted_interval_and_marathon_events() {
        let gateway = Arc::new(ScriptedGateway::ok());
        let writer = writer(gateway);

        assert!(matches!(
            writer.create(&draft("Backwards", 11, 10)).await,
            Err(CadenceError::Validation(_))
        ));
        assert!(matches!(
            writer.create(&draft("Marathon", 9, 18)).await,
            Err(CadenceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_attendee_email() {
        let gateway = Arc::new(ScriptedGateway::ok());
        let bad = draft("Sync", 10, 11).with_attendees(["not-an-email"]);

        let result = writer(gateway).create(&bad).await;
        assert!(matches!(result, Err(CadenceError::Validation(_))));
    }

    #[tokio::test]
    async fn dedupes_attendees() {
        let gateway = Arc::new(ScriptedGateway::ok());
        let d = draft("Sync", 10, 11)
            .with_attendees(["ana@example.com", " ana@example.com", "bo@corp.io"]);

        writer(gateway.clone()).create(&d).await.unwrap();
        assert_eq!(gateway.inserted.lock()[0].attendees, vec!["ana@example.com", "bo@corp.io"]);
    }

    #[tokio::test]
    async fn past_start_shifts_one_day_forward() {
        let gateway = Arc::new(ScriptedGateway::ok());
        // Clock says 08:00; the draft starts at 06:00 the same day.
        let stale = draft("Early", 6, 7);

        writer(gateway.clone()).create(&stale).await.unwrap();
        let sent = gateway.inserted.lock()[0].clone();
        assert_eq!(sent.start, Utc.with_ymd_and_hms(2025, 6, 3, 6, 0, 0).unwrap());
        assert_eq!(sent.end, Utc.with_ymd_and_hms(2025, 6, 3, 7, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let gateway = Arc::new(ScriptedGateway::failing_times(
            2,
            CadenceError::Network("connection reset".into()),
        ));
        let writer = EventWriter::with_max_attempts(
            gateway.clone(),
            Arc::new(FixedClock(now())),
            3,
        );

        // Backoff sleeps are real; paused tokio time auto-advances them.
        tokio::time::pause();
        let event = writer.create(&draft("Sync", 10, 11)).await.unwrap();

        assert_eq!(event.title, "Sync");
        assert_eq!(gateway.inserted.lock().len(), 1);
    }

    #[tokio::test]
    async fn permission_denied_is_not_retried() {
        let gateway = Arc::new(ScriptedGateway::failing_times(
            5,
            CadenceError::PermissionDenied("calendar scope missing".into()),
        ));
        let result = writer(gateway.clone()).create(&draft("Sync", 10, 11)).await;

        assert!(matches!(result, Err(CadenceError::PermissionDenied(_))));
        // One initial attempt, no retries.
        assert_eq!(gateway.failures.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_as_provider_error() {
        let gateway = Arc::new(ScriptedGateway::failing_times(
            10,
            CadenceError::Network("connection reset".into()),
        ));
        let writer =
            EventWriter::with_max_attempts(gateway, Arc::new(FixedClock(now())), 2);

        tokio::time::pause();
        let result = writer.create(&draft("Sync", 10, 11)).await;

        match result {
            Err(CadenceError::Provider(message)) => {
                assert!(message.contains("after 2 attempts"), "got: {message}");
                assert!(message.contains("connection reset"), "got: {message}");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn max_attempts_counts_the_initial_try() {
        let gateway = Arc::new(ScriptedGateway::failing_times(
            10,
            CadenceError::Network("connection reset".into()),
        ));
        let writer =
            EventWriter::with_max_attempts(gateway.clone(), Arc::new(FixedClock(now())), 3);

        tokio::time::pause();
        let result = writer.create(&draft("Sync", 10, 11)).await;

        assert!(matches!(result, Err(CadenceError::Provider(_))));
        // Three tries total: one initial attempt plus two retries.
        assert_eq!(gateway.failures.load(Ordering::SeqCst), 7);
    }

    #[tokio::test]
    async fn batch_continues_past_individual_failures() {
        let gateway = Arc::new(ScriptedGateway::ok());
        let drafts = vec![
            draft("First", 9, 10),
            draft("Second", 10, 11).with_attendees(["broken-email"]),
            draft("Third", 11, 12),
        ];

        let outcome = writer(gateway).create_batch(&drafts).await;
        assert_eq!(outcome.created.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].title, "Second");
        assert!(matches!(outcome.failed[0].error, CadenceError::Validation(_)));
    }
}
