//! Multi-step workflow execution
//!
//! The orchestrator turns one free-text request into an intent plan
//! and runs the plan's steps in order. Step failures are contained:
//! each failure is recorded on its step and execution moves on, so a
//! broken calendar write never swallows the email draft that should
//! follow it.

pub mod orchestrator;
pub mod ports;

pub use orchestrator::WorkflowOrchestrator;
