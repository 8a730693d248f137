//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `CADENCE_NLU_API_URL`: Chat-completions endpoint URL
//! - `CADENCE_NLU_API_KEY`: Extraction service API key
//! - `CADENCE_NLU_MODEL`: Model identifier (optional)
//! - `CADENCE_CALENDAR_API_URL`: Calendar provider base URL
//! - `CADENCE_CALENDAR_API_KEY`: Calendar provider API key
//! - `CADENCE_MAX_ATTEMPTS`: Total calendar write attempts (optional)
//! - `CADENCE_STEP_DEADLINE_SECS`: Per-step wall-clock budget (optional)
//! - `CADENCE_DEFAULT_MEETING_MINUTES`: Default meeting length (optional)
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `cadence.{json,toml}` in
//! the working directory, up to two parent directories, and next to
//! the executable.

use std::path::{Path, PathBuf};

use cadence_domain::{
    CadenceError, CalendarConfig, Config, NluConfig, Result, SchedulingConfig,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The NLU and calendar endpoint/key variables are required; the
/// scheduling tunables fall back to their defaults.
pub fn load_from_env() -> Result<Config> {
    let nlu_api_url = env_var("CADENCE_NLU_API_URL")?;
    let nlu_api_key = env_var("CADENCE_NLU_API_KEY")?;
    let nlu_model = std::env::var("CADENCE_NLU_MODEL")
        .unwrap_or_else(|_| NluConfig::default_model());

    let calendar_api_url = env_var("CADENCE_CALENDAR_API_URL")?;
    let calendar_api_key = env_var("CADENCE_CALENDAR_API_KEY")?;

    let defaults = SchedulingConfig::default();
    let max_attempts = env_parse("CADENCE_MAX_ATTEMPTS", defaults.max_attempts)?;
    let step_deadline_secs =
        env_parse("CADENCE_STEP_DEADLINE_SECS", defaults.step_deadline_secs)?;
    let default_meeting_minutes =
        env_parse("CADENCE_DEFAULT_MEETING_MINUTES", defaults.default_meeting_minutes)?;

    Ok(Config {
        nlu: NluConfig { api_url: nlu_api_url, api_key: nlu_api_key, model: nlu_model },
        calendar: CalendarConfig { api_url: calendar_api_url, api_key: calendar_api_key },
        scheduling: SchedulingConfig { max_attempts, step_deadline_secs, default_meeting_minutes },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CadenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CadenceError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CadenceError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CadenceError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, up to two parent
/// directories, and the executable's directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("cadence.json"),
            cwd.join("cadence.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("cadence.json"),
                exe_dir.join("cadence.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CadenceError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional numeric environment variable, falling back to the
/// given default when unset.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| CadenceError::Config(format!("Invalid value for {}: {}", key, raw))),
    }
}
