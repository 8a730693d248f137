//! # Cadence Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - HTTP client with retry support
//! - External service integrations (NLU extraction, calendar provider)
//! - Preference storage
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `cadence-core`
//! - Depends on `cadence-domain` and `cadence-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod stores;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::calendar::HttpCalendarGateway;
pub use integrations::nlu::NluClient;
pub use stores::preferences::InMemoryPreferenceStore;
