//! Ports to the outside world
//!
//! The orchestrator and event writer only speak to infrastructure
//! through these traits; `cadence-infra` supplies the real adapters
//! and tests supply fakes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use cadence_domain::{
    CalendarEvent, EventDraft, PreferencesPatch, Result, VersionedPreferences,
};

/// Read/write access to the external calendar provider.
///
/// An adapter is bound to one user's calendar at construction time
/// (its credentials select the account), so calls carry no user
/// identifier. Multi-tenant callers hold one gateway per user.
#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// List events overlapping `[start, end)`.
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>>;

    /// Create one event, returning the provider's record of it.
    async fn insert_event(&self, draft: &EventDraft) -> Result<CalendarEvent>;
}

/// Outbound email delivery.
///
/// Only invoked on an explicit user confirmation; workflow steps stage
/// drafts but never call this themselves. Like [`CalendarGateway`],
/// the adapter sends as the user it was constructed for.
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, body: &str) -> Result<()>;
}

/// The natural-language extraction service.
///
/// Returns the model's raw text response; callers run it through the
/// tolerant parsers in [`crate::intent`], never trusting the shape.
#[async_trait]
pub trait NluExtractor: Send + Sync {
    /// `system` frames the task, `user` is the raw request text.
    async fn extract(&self, system: &str, user: &str) -> Result<String>;
}

/// Versioned user preference storage with compare-and-swap updates.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<VersionedPreferences>;

    /// Apply `patch` iff the stored version still equals
    /// `expected_version`; a stale writer gets `Conflict`.
    async fn update(
        &self,
        user_id: &str,
        expected_version: u64,
        patch: &PreferencesPatch,
    ) -> Result<VersionedPreferences>;
}

/// Time source, injectable so tests can pin "now".
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today_in(&self, tz: chrono_tz::Tz) -> NaiveDate {
        self.now().with_timezone(&tz).date_naive()
    }
}

/// Wall-clock implementation of [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
