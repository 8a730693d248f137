//! # Cadence Domain
//!
//! Business domain types and models for the Cadence scheduling engine.
//!
//! This crate contains:
//! - Calendar and scheduling data types (CalendarEvent, TimeSlot, etc.)
//! - Workflow execution records and responses
//! - Intent plan types produced from untrusted NLU output
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Cadence crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
