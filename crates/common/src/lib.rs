//! Modular common utilities shared across Cadence crates.
//!
//! - `resilience`: retry strategies with exponential backoff and
//!   pluggable retry policies
//! - `validation`: field validation helpers (emails, clock times,
//!   bounded strings)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;
pub mod validation;

pub use resilience::retry::{
    BackoffStrategy, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryOutcome,
    RetryPolicy, RetryResult,
};
pub use validation::{is_valid_email, parse_clock_time, truncate_chars};
