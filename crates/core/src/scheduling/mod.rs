//! Event creation with validation and retry

mod event_writer;

pub use event_writer::{BatchFailure, BatchOutcome, EventWriter};
