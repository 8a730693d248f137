//! Calendar provider gateway

mod gateway;
mod types;

pub use gateway::HttpCalendarGateway;
