//! Single-request generation pipeline
//!
//! prompt -> provider -> validator, retried with a validation-aware policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::error::GenerationError;
use super::state::{AttemptState, AttemptTrace};
use crate::batch::ContentGenerator;
use crate::config::GenerationConfig;
use crate::domain::{AdCopy, ContentMetadata, GeneratedContent, GenerationRequest};
use crate::llm::{CompletionRequest, LlmProvider, Message, split_model_id};
use crate::prompts::{PromptBuilder, PromptOptions, PromptVariables};
use crate::validation::{ResponseValidator, ValidationResult, ValidationRules};

/// Outcome of one pipeline run and the states it went through
#[derive(Debug)]
pub struct PipelineRun {
    pub result: Result<GeneratedContent, GenerationError>,
    pub trace: AttemptTrace,
}

/// Generates validated content for one request
///
/// Every attempt rebuilds the prompt, calls the provider and validates with
/// auto-correction on. The last attempt also accepts partial results, so a
/// response that only misses a few items still fills the row.
pub struct GenerationPipeline {
    provider: Arc<dyn LlmProvider>,
    prompts: Arc<PromptBuilder>,
    options: PromptOptions,
    config: GenerationConfig,
}

impl GenerationPipeline {
    pub fn new(provider: Arc<dyn LlmProvider>, prompts: PromptBuilder, config: GenerationConfig) -> Self {
        debug!(?config, "GenerationPipeline::new: called");
        let prompts = prompts.with_min_description_length(config.min_description_length);
        Self {
            provider,
            prompts: Arc::new(prompts),
            options: PromptOptions::default(),
            config,
        }
    }

    pub fn with_options(mut self, options: PromptOptions) -> Self {
        self.options = options;
        self
    }

    fn rules(&self, final_attempt: bool) -> ValidationRules {
        ValidationRules {
            min_description_length: self.config.min_description_length,
            quality_threshold: self.config.quality_threshold,
            ..Default::default()
        }
        .strict(self.config.strict_mode)
        .auto_correct(true)
        .allow_partial(final_attempt)
    }

    fn completion_request(&self, request: &GenerationRequest, prompt: String) -> CompletionRequest {
        let (provider, model) = split_model_id(&request.model);
        CompletionRequest {
            provider: provider.unwrap_or_default().to_string(),
            model: model.to_string(),
            messages: vec![Message::system(self.prompts.system_message()), Message::user(prompt)],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    /// Run the attempt loop to a terminal state
    pub async fn run(&self, request: &GenerationRequest) -> PipelineRun {
        debug!(ad_group = %request.ad_group.name, model = %request.model, "GenerationPipeline::run: called");
        let started = Instant::now();
        let max_attempts = self.config.max_attempts.max(1);
        let mut trace = AttemptTrace::new();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let final_attempt = attempt == max_attempts;
            trace.advance(AttemptState::BuildingPrompt);
            let prompt = self.prompts.build(&PromptVariables::from_request(request), &self.options);

            trace.advance(AttemptState::AwaitingLlm);
            let error = match self.provider.complete(self.completion_request(request, prompt)).await {
                Ok(raw) => {
                    trace.advance(AttemptState::Validating);
                    let result = ResponseValidator::new(self.rules(final_attempt)).validate_and_correct(&raw);
                    match usable_copy(&result) {
                        Ok(copy) => {
                            trace.advance(AttemptState::Succeeded);
                            let content = GeneratedContent::new(copy, ContentMetadata {
                                model: request.model.clone(),
                                industry: request.effective_industry().map(str::to_string),
                                timestamp: chrono::Utc::now().timestamp_millis(),
                                validation_score: result.score,
                                processing_time_ms: started.elapsed().as_millis() as u64,
                                retry_count: attempt - 1,
                            });
                            info!(
                                ad_group = %request.ad_group.name,
                                attempt,
                                score = result.score,
                                complete = content.is_complete(),
                                "Generated content"
                            );
                            return PipelineRun {
                                result: Ok(content),
                                trace,
                            };
                        }
                        Err(message) => GenerationError::Validation(message),
                    }
                }
                Err(e) => GenerationError::Provider(e),
            };

            warn!(ad_group = %request.ad_group.name, attempt, error = %error, "Generation attempt failed");
            last_error = error.to_string();

            if !error.is_retryable() {
                debug!("GenerationPipeline::run: error is not retryable");
                trace.advance(AttemptState::FailedAfterRetries);
                return PipelineRun {
                    result: Err(error),
                    trace,
                };
            }
            if final_attempt {
                trace.advance(AttemptState::FailedAfterRetries);
                break;
            }

            trace.advance(AttemptState::Retrying);
            let backoff = match &error {
                GenerationError::Provider(e) => e.retry_after().unwrap_or_default().max(self.backoff(attempt)),
                _ => self.backoff(attempt),
            };
            debug!(attempt, ?backoff, "GenerationPipeline::run: backing off");
            tokio::time::sleep(backoff).await;
        }

        PipelineRun {
            result: Err(GenerationError::Exhausted {
                attempts: trace.attempts(),
                last_error,
            }),
            trace,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config.retry_delay() * attempt
    }
}

/// Copy the row may be filled with, or why the response was rejected
fn usable_copy(result: &ValidationResult) -> Result<AdCopy, String> {
    if !result.is_valid {
        if result.errors.is_empty() {
            return Err(format!("quality score {:.2} is below the threshold", result.score));
        }
        return Err(result.error_summary());
    }
    match result.final_content() {
        Some(copy) if !copy.titles.is_empty() && !copy.descriptions.is_empty() => Ok(copy.clone()),
        _ => Err("Response contained no usable titles or descriptions".to_string()),
    }
}

#[async_trait]
impl ContentGenerator for GenerationPipeline {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GenerationError> {
        self.run(request).await.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdGroupContext, CampaignContext, ClientProfile};
    use crate::llm::client::mock::{MockLlmProvider, MockReply};
    use AttemptState::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "anthropic:claude-haiku".to_string(),
            client: ClientProfile {
                name: "Stride".to_string(),
                ..Default::default()
            },
            campaign: CampaignContext {
                name: "Spring".to_string(),
                context: String::new(),
            },
            ad_group: AdGroupContext {
                name: "Trail".to_string(),
                keywords: vec!["trail shoes".to_string()],
            },
            industry: Some("e-commerce".to_string()),
            target_persona: None,
            temperature: 0.4,
            max_tokens: 900,
        }
    }

    fn response(titles: usize) -> String {
        let titles: Vec<String> = (1..=titles).map(|i| format!("Trail Shoes Deal {}", i)).collect();
        let descriptions: Vec<String> = (1..=4)
            .map(|i| format!("Shop grippy trail running shoes built for mud and rock, offer {}.", i))
            .collect();
        serde_json::json!({ "titles": titles, "descriptions": descriptions }).to_string()
    }

    fn pipeline(provider: Arc<MockLlmProvider>) -> GenerationPipeline {
        let config = GenerationConfig {
            retry_delay_ms: 0,
            ..Default::default()
        };
        GenerationPipeline::new(provider, PromptBuilder::embedded_only(), config)
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let provider = Arc::new(MockLlmProvider::always(response(15)));
        let run = pipeline(provider.clone()).run(&request()).await;

        let content = run.result.unwrap();
        assert!(content.is_complete());
        assert_eq!(content.metadata.retry_count, 0);
        assert_eq!(content.metadata.model, "anthropic:claude-haiku");
        assert_eq!(content.metadata.industry.as_deref(), Some("e-commerce"));
        assert_eq!(run.trace.states(), &[Pending, BuildingPrompt, AwaitingLlm, Validating, Succeeded]);

        let sent = provider.requests();
        assert_eq!(sent[0].provider, "anthropic");
        assert_eq!(sent[0].model, "claude-haiku");
        assert_eq!(sent[0].max_tokens, 900);
        assert_eq!(sent[0].messages.len(), 2);
        assert!(sent[0].messages[1].content.contains("Trail"));
    }

    #[tokio::test]
    async fn test_retries_after_unparseable_response() {
        let provider = Arc::new(MockLlmProvider::new(vec![
            MockReply::Text("Sorry, I cannot help with that.".to_string()),
            MockReply::Text(response(15)),
        ]));
        let run = pipeline(provider.clone()).run(&request()).await;

        assert_eq!(run.result.unwrap().metadata.retry_count, 1);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(
            run.trace.states(),
            &[
                Pending,
                BuildingPrompt,
                AwaitingLlm,
                Validating,
                Retrying,
                BuildingPrompt,
                AwaitingLlm,
                Validating,
                Succeeded
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_completion_is_retried() {
        let provider = Arc::new(MockLlmProvider::new(vec![MockReply::Empty, MockReply::Text(response(15))]));
        let run = pipeline(provider.clone()).run(&request()).await;

        let content = run.result.unwrap();
        assert!(content.is_complete());
        assert_eq!(content.metadata.retry_count, 1);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_request_is_not_retried() {
        let provider = Arc::new(MockLlmProvider::new(vec![MockReply::Rejected(401)]));
        let run = pipeline(provider.clone()).run(&request()).await;

        let err = run.result.unwrap_err();
        assert!(matches!(err, GenerationError::Provider(_)));
        assert!(!err.is_retryable());
        assert_eq!(provider.call_count(), 1);
        assert_eq!(run.trace.current(), FailedAfterRetries);
    }

    #[tokio::test]
    async fn test_final_attempt_accepts_partial_content() {
        let provider = Arc::new(MockLlmProvider::always(response(10)));
        let run = pipeline(provider.clone()).run(&request()).await;

        let content = run.result.unwrap();
        assert_eq!(provider.call_count(), 3);
        assert_eq!(content.titles.len(), 10);
        assert_eq!(content.metadata.retry_count, 2);
        assert!(!content.is_complete());
    }

    #[tokio::test]
    async fn test_provider_failures_exhaust_attempts() {
        let provider = Arc::new(MockLlmProvider::new(vec![]));
        let run = pipeline(provider.clone()).run(&request()).await;

        let err = run.result.unwrap_err();
        assert!(matches!(err, GenerationError::Exhausted { attempts: 3, .. }));
        assert!(err.to_string().contains("No more mock responses"));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(run.trace.current(), FailedAfterRetries);
        assert_eq!(run.trace.attempts(), 3);
    }

    #[tokio::test]
    async fn test_quality_threshold_rejects_low_scores() {
        let provider = Arc::new(MockLlmProvider::always(response(15)));
        let config = GenerationConfig {
            retry_delay_ms: 0,
            max_attempts: 1,
            quality_threshold: 1.01,
            ..Default::default()
        };
        let run = GenerationPipeline::new(provider, PromptBuilder::embedded_only(), config)
            .run(&request())
            .await;
        let err = run.result.unwrap_err();
        assert!(err.to_string().contains("below the threshold"));
    }

    #[tokio::test]
    async fn test_as_content_generator() {
        let provider = Arc::new(MockLlmProvider::always(response(15)));
        let generator: Arc<dyn ContentGenerator> = Arc::new(pipeline(provider));
        assert!(generator.generate(&request()).await.is_ok());
    }
}
