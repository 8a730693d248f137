//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Cadence
///
/// External service failures are split into the three classes the
/// scheduling engine treats differently: permission errors are never
/// retried, rate limits fail with a distinct user-facing message, and
/// transient network/provider errors are retried with backoff.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CadenceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Version conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CadenceError {
    /// Whether a retry with backoff has any chance of succeeding.
    ///
    /// Permission and quota errors are terminal for the current call;
    /// only network and provider-side failures count as transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CadenceError::Network(_) | CadenceError::Provider(_))
    }

    /// Whether this error indicates provider-side throttling.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, CadenceError::RateLimited(_))
    }
}

/// Result type alias for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(CadenceError::Network("timeout".into()).is_retryable());
        assert!(CadenceError::Provider("backend 503".into()).is_retryable());
    }

    #[test]
    fn terminal_errors_are_not_retryable() {
        assert!(!CadenceError::PermissionDenied("no calendar scope".into()).is_retryable());
        assert!(!CadenceError::RateLimited("quota exceeded".into()).is_retryable());
        assert!(!CadenceError::Validation("empty title".into()).is_retryable());
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = CadenceError::RateLimited("quota".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "RateLimited");
        assert_eq!(json["message"], "quota");
    }
}
