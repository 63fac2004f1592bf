//! ContentGenerator trait definition

use async_trait::async_trait;

use crate::domain::{GeneratedContent, GenerationRequest};
use crate::orchestrator::GenerationError;

/// Produces validated content for one request
///
/// Implemented by the generation pipeline; the batch processor only sees
/// this seam so it can be exercised without a provider.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GenerationError>;
}
