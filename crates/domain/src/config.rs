//! Application configuration structures
//!
//! Loaded by `cadence-infra` from environment variables or a config
//! file; see the loader there for the resolution order.

use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub nlu: NluConfig,
    pub calendar: CalendarConfig,
    pub scheduling: SchedulingConfig,
}

/// NLU extraction service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluConfig {
    /// Chat completions endpoint URL.
    pub api_url: String,
    /// API key for the extraction service.
    pub api_key: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
}

/// Calendar provider gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Base URL of the calendar provider API.
    pub api_url: String,
    /// Bearer token or API key for the provider.
    pub api_key: String,
}

/// Scheduling and workflow engine tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Total calendar write attempts, the initial try included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wall-clock budget for a single workflow step, in seconds.
    #[serde(default = "default_step_deadline")]
    pub step_deadline_secs: u64,
    /// Default meeting duration when the request does not specify one.
    #[serde(default = "default_meeting_minutes")]
    pub default_meeting_minutes: u32,
}

impl NluConfig {
    /// Model used when none is configured.
    pub fn default_model() -> String {
        default_model()
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_step_deadline() -> u64 {
    60
}

fn default_meeting_minutes() -> u32 {
    30
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            step_deadline_secs: default_step_deadline(),
            default_meeting_minutes: default_meeting_minutes(),
        }
    }
}
