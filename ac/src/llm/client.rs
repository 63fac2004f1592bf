//! LlmProvider trait definition

use async_trait::async_trait;

use super::{CompletionRequest, LlmError};

/// Stateless LLM provider - each call is independent
///
/// Implementations unwrap their provider-specific envelope and return the
/// assistant text only. Retry policy above transport level (validation-aware
/// retries, batch retries) lives in the callers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a single completion request and return the reply text
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tracing::debug;

    /// Scripted reply for the mock provider
    #[derive(Debug, Clone)]
    pub enum MockReply {
        Text(String),
        /// Server fault (500)
        Fail(String),
        /// Envelope without any text
        Empty,
        /// Request refused with the given status
        Rejected(u16),
    }

    type Handler = Box<dyn Fn(&CompletionRequest, usize) -> MockReply + Send + Sync>;

    /// Mock LLM provider for unit tests
    pub struct MockLlmProvider {
        handler: Handler,
        call_count: AtomicUsize,
        requests: Mutex<Vec<CompletionRequest>>,
        delay: Duration,
    }

    impl MockLlmProvider {
        /// Replies in order; errors once the script is exhausted
        pub fn new(replies: Vec<MockReply>) -> Self {
            debug!(reply_count = %replies.len(), "MockLlmProvider::new: called");
            Self::with_handler(move |_, idx| {
                replies
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| MockReply::Fail("No more mock responses".to_string()))
            })
        }

        /// Reply computed from the request and call index
        pub fn with_handler(handler: impl Fn(&CompletionRequest, usize) -> MockReply + Send + Sync + 'static) -> Self {
            Self {
                handler: Box::new(handler),
                call_count: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                delay: Duration::ZERO,
            }
        }

        /// Always reply with the same text
        pub fn always(text: impl Into<String>) -> Self {
            let text = text.into();
            Self::with_handler(move |_, _| MockReply::Text(text.clone()))
        }

        /// Sleep before every reply
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            debug!("MockLlmProvider::complete: called");
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request.clone());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match (self.handler)(&request, idx) {
                MockReply::Text(text) => Ok(text),
                MockReply::Fail(message) => Err(LlmError::ApiError { status: 500, message }),
                MockReply::Empty => Err(LlmError::InvalidResponse("Response contained no text".to_string())),
                MockReply::Rejected(status) => Err(LlmError::ApiError {
                    status,
                    message: "rejected".to_string(),
                }),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::llm::Message;

        fn request() -> CompletionRequest {
            CompletionRequest {
                provider: "openai".to_string(),
                model: "gpt-4o".to_string(),
                messages: vec![Message::user("Hi")],
                max_tokens: 100,
                temperature: 0.5,
            }
        }

        #[tokio::test]
        async fn test_mock_provider_returns_replies() {
            let provider = MockLlmProvider::new(vec![
                MockReply::Text("Response 1".to_string()),
                MockReply::Text("Response 2".to_string()),
            ]);

            assert_eq!(provider.complete(request()).await.unwrap(), "Response 1");
            assert_eq!(provider.complete(request()).await.unwrap(), "Response 2");
            assert_eq!(provider.call_count(), 2);
            assert_eq!(provider.requests().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_provider_errors_when_exhausted() {
            let provider = MockLlmProvider::new(vec![]);
            assert!(provider.complete(request()).await.is_err());
        }
    }
}
