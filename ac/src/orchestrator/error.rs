//! Generation error types

use thiserror::Error;

use crate::llm::LlmError;
use crate::sheet::{PatchError, StoreError};
use crate::throttle::ThrottleError;

/// Errors that can end a generation
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("Invalid response: {0}")]
    Validation(String),

    #[error("Generation failed after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error(transparent)]
    Throttled(#[from] ThrottleError),

    #[error("Sheet store error: {0}")]
    Store(#[from] StoreError),

    #[error("Sheet store did not accept the save")]
    SaveRejected,

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("Sheet '{0}' has no header row")]
    MissingHeader(String),
}

impl GenerationError {
    /// Worth another attempt
    ///
    /// An exhausted run only ever saw retryable failures, so a later run
    /// may still succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerationError::Provider(e) => e.is_retryable(),
            GenerationError::Validation(_) | GenerationError::Exhausted { .. } => true,
            _ => false,
        }
    }
}
