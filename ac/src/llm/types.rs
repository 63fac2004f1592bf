//! LLM request types
//!
//! Provider-agnostic: each client maps these onto its own wire format and
//! unwraps the reply to plain text.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Provider name (`openai`, `anthropic`); empty selects the router default
    pub provider: String,

    /// Model name without provider prefix
    pub model: String,

    /// Conversation, system message first when present
    pub messages: Vec<Message>,

    /// Max tokens for the response
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl CompletionRequest {
    /// Concatenated system messages, if any
    pub fn system_prompt(&self) -> Option<String> {
        let system: Vec<&str> = self
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        debug!(count = system.len(), "CompletionRequest::system_prompt: called");
        if system.is_empty() { None } else { Some(system.join("\n\n")) }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Split `provider:model` or `provider/model` into its parts
///
/// Returns `None` for the provider when the identifier carries no prefix.
pub fn split_model_id(model_id: &str) -> (Option<&str>, &str) {
    let model_id = model_id.trim();
    match model_id.split_once([':', '/']) {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => (Some(provider), model),
        _ => (None, model_id),
    }
}
