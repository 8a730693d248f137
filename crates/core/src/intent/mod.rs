//! Intent plan parsing and validation
//!
//! The NLU service returns free text that should contain JSON but
//! carries no schema guarantee. Everything in this module is written
//! so that arbitrary garbage input degrades to a usable heuristic plan
//! instead of an error; malformed AI output must never propagate an
//! error to the caller.

pub mod meeting;
pub mod parser;

pub use meeting::{validate_meeting, ValidatedMeeting};
pub use parser::{extract_emails, parse_extracted_meetings, parse_intent_plan};
