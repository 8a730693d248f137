//! HTTP calendar gateway
//!
//! Listing tolerates malformed provider items: each entry is decoded
//! on its own, bad ones are skipped with a warning and the rest are
//! returned. One corrupt record must not blank the whole calendar.

use async_trait::async_trait;
use cadence_core::CalendarGateway;
use cadence_domain::{CadenceError, CalendarConfig, CalendarEvent, EventDraft, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use tracing::{debug, warn};

use crate::http::HttpClient;

use super::types::{ListEventsResponse, WireEvent};

/// Calendar provider adapter over a REST events API.
pub struct HttpCalendarGateway {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

impl HttpCalendarGateway {
    pub fn new(config: &CalendarConfig, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn events_url(&self) -> String {
        format!("{}/events", self.api_url)
    }
}

#[async_trait]
impl CalendarGateway for HttpCalendarGateway {
    async fn list_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let request = self
            .http_client
            .request(Method::GET, self.events_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .query(&[
                ("start", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("end", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ]);

        let response = self.http_client.execute(request).await?;
        let listing: ListEventsResponse = response.json().await.map_err(|e| {
            CadenceError::Provider(format!("failed to parse event listing: {e}"))
        })?;

        let total = listing.items.len();
        let events: Vec<CalendarEvent> = listing
            .items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<WireEvent>(item) {
                Ok(wire) => Some(CalendarEvent::from(wire)),
                Err(error) => {
                    warn!(%error, "skipping malformed provider event");
                    None
                }
            })
            .collect();

        debug!(total, kept = events.len(), "fetched calendar events");
        Ok(events)
    }

    async fn insert_event(&self, draft: &EventDraft) -> Result<CalendarEvent> {
        let request = self
            .http_client
            .request(Method::POST, self.events_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(draft);

        let response = self.http_client.execute(request).await?;
        let wire: WireEvent = response.json().await.map_err(|e| {
            CadenceError::Provider(format!("failed to parse created event: {e}"))
        })?;
        Ok(CalendarEvent::from(wire))
    }
}
