//! Generic retry strategy implementation
//!
//! Provides a flexible retry mechanism for any operation that might
//! fail transiently. Supports fixed and exponential backoff and a
//! policy trait for deciding, per error, whether another attempt is
//! worthwhile.

use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur during retry operations
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retry attempts have been exhausted
    #[error("All retry attempts exhausted after {attempts} tries")]
    AttemptsExhausted { attempts: u32 },

    /// The operation failed with a non-retryable error
    #[error("Operation failed with non-retryable error: {source}")]
    NonRetryable { source: E },
}

/// Result type for retry operations
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Outcome of a retry execution including summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    pub attempts: u32,
    pub total_delay: Duration,
    /// Human-readable representation of the last error that occurred.
    pub last_error: Option<String>,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }
}

/// Trait for determining whether an error should be retried
pub trait RetryPolicy<E> {
    /// Decide whether the error is worth another attempt.
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision;
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the operation with the default backoff delay
    Retry,
    /// Retry the operation with a custom delay
    RetryAfter(Duration),
    /// Don't retry the operation
    Stop,
}

/// Blanket impl so closures can act as policies.
impl<E, F> RetryPolicy<E> for F
where
    F: Fn(&E, u32) -> RetryDecision,
{
    fn should_retry(&self, error: &E, attempt: u32) -> RetryDecision {
        self(error, attempt)
    }
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Exponential backoff: initial_delay * base^(attempt-1), capped at
    /// max_delay. Attempt numbers are 1-based.
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// Calculate the delay before the retry following `attempt`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = attempt.saturating_sub(1).min(16);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent as i32);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (initial try + retries)
    pub max_attempts: u32,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(1000),
                base: 2.0,
                max_delay: Duration::from_secs(10),
            },
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, backoff: BackoffStrategy) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff }
    }
}

/// The main retry executor
pub struct RetryExecutor<P> {
    config: RetryConfig,
    policy: P,
}

impl<P> RetryExecutor<P> {
    /// Create a new retry executor with the given configuration and policy
    pub fn new(config: RetryConfig, policy: P) -> Self {
        Self { config, policy }
    }

    /// Create with default configuration
    pub fn with_policy(policy: P) -> Self {
        Self::new(RetryConfig::default(), policy)
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation and return outcome statistics alongside the
    /// result.
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        P: RetryPolicy<E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let started = Instant::now();
        let mut total_delay = Duration::ZERO;
        let mut last_error: Option<String> = None;
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match operation().await {
                Ok(value) => {
                    debug!(attempt, elapsed = ?started.elapsed(), "operation succeeded");
                    return RetryOutcome {
                        result: Ok(value),
                        attempts: attempt,
                        total_delay,
                        last_error,
                    };
                }
                Err(err) => {
                    last_error = Some(err.to_string());

                    if attempt >= max_attempts {
                        warn!(attempt, error = %err, "retry attempts exhausted");
                        return RetryOutcome {
                            result: Err(RetryError::AttemptsExhausted { attempts: attempt }),
                            attempts: attempt,
                            total_delay,
                            last_error,
                        };
                    }

                    let delay = match self.policy.should_retry(&err, attempt) {
                        RetryDecision::Stop => {
                            debug!(attempt, error = %err, "error is not retryable");
                            return RetryOutcome {
                                result: Err(RetryError::NonRetryable { source: err }),
                                attempts: attempt,
                                total_delay,
                                last_error,
                            };
                        }
                        RetryDecision::Retry => self.config.backoff.calculate_delay(attempt),
                        RetryDecision::RetryAfter(custom) => custom,
                    };

                    debug!(attempt, ?delay, error = %err, "retrying after backoff");
                    total_delay += delay;
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        // Loop always returns from within; keep the compiler satisfied.
        RetryOutcome {
            result: Err(RetryError::AttemptsExhausted { attempts: max_attempts }),
            attempts: max_attempts,
            total_delay,
            last_error,
        }
    }
}
