//! Natural-language extraction over a chat-completions API

mod client;
mod types;

pub use client::NluClient;
