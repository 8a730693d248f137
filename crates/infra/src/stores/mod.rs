//! Storage adapters

pub mod preferences;
