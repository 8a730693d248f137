//! Shared HTTP transport for the provider adapters
//!
//! Every response is mapped onto the domain error taxonomy right here:
//! a non-success status becomes the matching `CadenceError`, and only
//! errors the taxonomy marks retryable (connect faults, timeouts, 5xx)
//! get another attempt. Authorization failures and throttling surface
//! on the first response so callers never re-send doomed requests.

use std::time::Duration;

use cadence_domain::{CadenceError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use crate::errors::InfraError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_BACKOFF: Duration = Duration::from_millis(200);
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// HTTP client shared by the NLU and calendar adapters.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: u32,
    base_backoff: Duration,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start a request against the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Send the request, mapping failures onto the domain taxonomy.
    ///
    /// Returns a response only for success statuses. Requests with
    /// streaming bodies cannot be replayed and are rejected up front.
    pub async fn execute(&self, builder: RequestBuilder) -> Result<Response> {
        let mut attempt = 1u32;

        loop {
            let request = builder
                .try_clone()
                .ok_or_else(|| {
                    CadenceError::Internal(
                        "streaming request bodies cannot be retried; buffer the body first"
                            .into(),
                    )
                })?
                .build()
                .map_err(|err| CadenceError::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt, %method, %url, "sending HTTP request");

            let error = match self.client.execute(request).await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    classify_status(status, &body)
                }
                Err(err) => CadenceError::from(InfraError::from(err)),
            };

            if attempt >= self.max_attempts || !error.is_retryable() {
                return Err(error);
            }

            let delay = self.backoff(attempt);
            warn!(attempt, %method, %url, %error, ?delay, "transient HTTP failure, backing off");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1).min(16));
        self.base_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Map a non-success HTTP status onto the domain taxonomy.
///
/// 401/403 are authorization failures no retry layer may touch; 429 is
/// throttling with its own user-facing treatment; 5xx is a transient
/// provider fault and the only status class worth another attempt.
fn classify_status(status: StatusCode, body: &str) -> CadenceError {
    match status.as_u16() {
        401 | 403 => CadenceError::PermissionDenied(format!("status {status}: {body}")),
        429 => CadenceError::RateLimited(format!("status {status}: {body}")),
        404 => CadenceError::NotFound(format!("status {status}: {body}")),
        code if status.is_server_error() => {
            CadenceError::Provider(format!("status {code}: {body}"))
        }
        code if status.is_client_error() => {
            CadenceError::Validation(format!("request rejected with status {code}: {body}"))
        }
        code => CadenceError::Internal(format!("unexpected status {code}: {body}")),
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: u32,
    base_backoff: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_backoff: DEFAULT_BASE_BACKOFF,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Total attempts per request, the initial try included.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .no_proxy()
            .build()
            .map_err(|err| CadenceError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}
