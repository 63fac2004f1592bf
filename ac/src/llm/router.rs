//! Provider routing
//!
//! Dispatches each request to the client registered under its provider
//! name, so one orchestrator can serve rows bound to different vendors.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionRequest, LlmError, LlmProvider};

/// Routes completion requests by provider name
pub struct ProviderRouter {
    default_provider: String,
    providers: BTreeMap<String, Arc<dyn LlmProvider>>,
}

impl ProviderRouter {
    /// Create an empty router with the given default provider name
    pub fn new(default_provider: impl Into<String>) -> Self {
        let default_provider = default_provider.into();
        debug!(%default_provider, "ProviderRouter::new: called");
        Self {
            default_provider,
            providers: BTreeMap::new(),
        }
    }

    /// Register a provider under `name`
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        let name = name.into();
        debug!(%name, "ProviderRouter::register: called");
        self.providers.insert(name, provider);
    }

    /// Builder-style registration
    pub fn with(mut self, name: impl Into<String>, provider: Arc<dyn LlmProvider>) -> Self {
        self.register(name, provider);
        self
    }

    /// Names of registered providers
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn default_provider(&self) -> &str {
        &self.default_provider
    }

    fn resolve(&self, provider: &str) -> Result<&Arc<dyn LlmProvider>, LlmError> {
        let name = if provider.is_empty() {
            debug!("ProviderRouter::resolve: empty provider, using default");
            self.default_provider.as_str()
        } else {
            provider
        };
        self.providers
            .get(name)
            .ok_or_else(|| LlmError::UnknownProvider(name.to_string()))
    }
}

#[async_trait]
impl LlmProvider for ProviderRouter {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        debug!(provider = %request.provider, model = %request.model, "ProviderRouter::complete: called");
        let provider = self.resolve(&request.provider)?;
        provider.complete(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;
    use crate::llm::client::mock::MockLlmProvider;

    fn request(provider: &str) -> CompletionRequest {
        CompletionRequest {
            provider: provider.to_string(),
            model: "m".to_string(),
            messages: vec![Message::user("hi")],
            max_tokens: 10,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_routes_by_provider_name() {
        let router = ProviderRouter::new("openai")
            .with("openai", Arc::new(MockLlmProvider::always("from openai")))
            .with("anthropic", Arc::new(MockLlmProvider::always("from anthropic")));

        assert_eq!(router.complete(request("anthropic")).await.unwrap(), "from anthropic");
        assert_eq!(router.complete(request("")).await.unwrap(), "from openai");
        assert_eq!(router.provider_names(), vec!["anthropic", "openai"]);
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let router = ProviderRouter::new("openai");
        let err = router.complete(request("mistral")).await.unwrap_err();
        assert!(matches!(err, LlmError::UnknownProvider(ref p) if p == "mistral"));
    }
}
