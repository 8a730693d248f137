//! Chat-completions client implementing the extraction port

use async_trait::async_trait;
use cadence_core::NluExtractor;
use cadence_domain::{CadenceError, NluConfig, Result};
use reqwest::Method;

use crate::http::HttpClient;

use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

const DEFAULT_MAX_TOKENS: u32 = 2_000;
const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Extraction client speaking the chat-completions protocol.
///
/// Returns the model's raw text; tolerant parsing of that text lives
/// in `cadence-core`, so a confused model never errors here.
pub struct NluClient {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
}

impl NluClient {
    pub fn new(config: &NluConfig, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }

    async fn call_api(&self, system: &str, user: &str) -> Result<String> {
        let payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system.to_string() },
                ChatMessage { role: "user".to_string(), content: user.to_string() },
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        };

        let request = self
            .http_client
            .request(Method::POST, &self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload);

        let response = self.http_client.execute(request).await?;
        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            CadenceError::Provider(format!("failed to parse completion response: {e}"))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CadenceError::Provider("completion contained no choices".into()))?;
        Ok(choice.message.content)
    }
}

#[async_trait]
impl NluExtractor for NluClient {
    async fn extract(&self, system: &str, user: &str) -> Result<String> {
        self.call_api(system, user).await
    }
}
