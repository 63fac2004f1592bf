//! LLM provider module
//!
//! The provider collaborator: a trait, vendor clients, and a router that
//! picks the client from the request's provider name.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

mod anthropic;
pub mod client;
mod error;
mod openai;
mod router;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmProvider;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use router::ProviderRouter;
pub use types::{CompletionRequest, Message, Role, split_model_id};

use crate::config::{LlmConfig, ProviderConfig};

/// Create a single client for a named provider
pub fn create_client(name: &str, provider: &ProviderConfig, config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    debug!(%name, "create_client: called");
    let timeout = Duration::from_millis(config.timeout_ms);
    match name {
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(provider, config.max_tokens, timeout)?))
        }
        "openai" => {
            debug!("create_client: creating OpenAI client");
            Ok(Arc::new(OpenAIClient::from_config(provider, config.max_tokens, timeout)?))
        }
        other if provider.openai_compatible => {
            debug!(provider = %other, "create_client: creating OpenAI-compatible client");
            Ok(Arc::new(OpenAIClient::from_config(provider, config.max_tokens, timeout)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::UnknownProvider(other.to_string()))
        }
    }
}

/// Build a router holding every configured provider whose API key is available
///
/// Providers without a key are skipped with a warning; the default provider
/// must be constructible.
pub fn create_router(config: &LlmConfig) -> Result<ProviderRouter, LlmError> {
    let default_provider = config.default_provider().to_string();
    debug!(%default_provider, "create_router: called");
    let mut router = ProviderRouter::new(default_provider.clone());

    for (name, provider) in &config.providers {
        match create_client(name, provider, config) {
            Ok(client) => router.register(name.clone(), client),
            Err(e) if name == &default_provider => return Err(e),
            Err(e) => warn!(provider = %name, error = %e, "create_router: skipping provider"),
        }
    }

    if router.provider_names().is_empty() || !config.providers.contains_key(&default_provider) {
        return Err(LlmError::UnknownProvider(default_provider));
    }

    Ok(router)
}
