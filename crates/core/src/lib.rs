//! # Cadence Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Availability computation and conflict detection
//! - Intent plan parsing and validation over untrusted NLU output
//! - The multi-step workflow orchestrator
//! - The retrying event writer
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `cadence-common` and `cadence-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod availability;
pub mod conflicts;
pub mod intent;
pub mod scheduling;
pub mod views;
pub mod workflow;

// Re-export specific items to avoid ambiguity
pub use availability::{assemble_day_schedule, compute_available_slots};
pub use conflicts::{detect_conflicts, layout_overlaps, EventLayout};
pub use intent::{parse_extracted_meetings, parse_intent_plan, ValidatedMeeting};
pub use scheduling::{BatchFailure, BatchOutcome, EventWriter};
pub use views::ScheduleService;
pub use workflow::ports::{
    CalendarGateway, Clock, EmailGateway, NluExtractor, PreferenceStore, SystemClock,
};
pub use workflow::WorkflowOrchestrator;
