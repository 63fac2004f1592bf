//! Anthropic Claude API client implementation
//!
//! Implements the LlmProvider trait for Anthropic's Messages API. System
//! messages are lifted into the top-level `system` field.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::check_status;
use super::{CompletionRequest, LlmError, LlmProvider, Role};
use crate::config::ProviderConfig;

/// Messages API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude API client
pub struct AnthropicClient {
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Create a new client from provider configuration
    pub fn from_config(config: &ProviderConfig, max_tokens: u32, timeout: Duration) -> Result<Self, LlmError> {
        debug!(base_url = %config.base_url, "AnthropicClient::from_config: called");
        let api_key = config
            .get_api_key()
            .ok_or_else(|| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens,
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%request.model, %request.max_tokens, "build_request_body: called");
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "temperature": request.temperature.clamp(0.0, 1.0),
            "messages": messages,
        });

        if let Some(system) = request.system_prompt() {
            debug!("build_request_body: adding system prompt");
            body["system"] = serde_json::json!(system);
        }

        body
    }

    /// Concatenate the text blocks of the API response
    fn parse_response(&self, api_response: AnthropicResponse) -> Result<String, LlmError> {
        debug!(?api_response.stop_reason, "parse_response: called");
        let text: String = api_response
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .collect();

        if text.trim().is_empty() {
            debug!("parse_response: no text blocks");
            return Err(LlmError::InvalidResponse("Response contained no text".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl LlmProvider for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(%request.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1/messages", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let api_response: AnthropicResponse = response.json().await?;
        debug!("complete: success");
        self.parse_response(api_response)
    }
}

// Anthropic API response types

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(other)]
    Other,
}
