//! Resilience patterns for fault tolerance
//!
//! This module provides generic, reusable retry logic with
//! configurable backoff strategies and customizable retry conditions.
//! The implementations are generic over error types so callers decide
//! which failures are worth retrying.

pub mod retry;

pub use retry::{
    BackoffStrategy, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryOutcome,
    RetryPolicy, RetryResult,
};
