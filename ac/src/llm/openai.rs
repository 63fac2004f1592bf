//! OpenAI API client implementation
//!
//! Implements the LlmProvider trait for OpenAI's Chat Completions API (and
//! compatible gateways reachable through a custom base URL).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::error::check_status;
use super::{CompletionRequest, LlmError, LlmProvider};
use crate::config::ProviderConfig;

/// OpenAI API client
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a new client from provider configuration
    pub fn from_config(config: &ProviderConfig, max_tokens: u32, timeout: Duration) -> Result<Self, LlmError> {
        debug!(base_url = %config.base_url, "OpenAIClient::from_config: called");
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

    /// Build the request body for the OpenAI API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%request.model, %request.max_tokens, "build_request_body: called");

        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        let max_tokens = request.max_tokens.min(self.max_tokens);

        // GPT-5.x and o1/o3 models use max_completion_tokens and a fixed temperature
        let reasoning_model =
            request.model.starts_with("gpt-5") || request.model.starts_with("o1") || request.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
        });

        if reasoning_model {
            debug!("build_request_body: reasoning model, using max_completion_tokens");
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
            body["temperature"] = serde_json::json!(request.temperature);
        }

        body
    }

    /// Extract the assistant text from the API response
    fn parse_response(&self, api_response: OpenAIResponse) -> Result<String, LlmError> {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no text".to_string()))
    }
}

#[async_trait]
impl LlmProvider for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(%request.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let api_response: OpenAIResponse = response.json().await?;
        debug!("complete: success");
        self.parse_response(api_response)
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}
