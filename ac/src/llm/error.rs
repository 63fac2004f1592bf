//! LLM error types

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors raised by LLM providers
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown LLM provider: '{0}'")]
    UnknownProvider(String),

    #[error("API key not found. Set the {0} environment variable.")]
    MissingApiKey(String),
}

/// HTTP statuses worth another request: timeouts, throttling, server faults
fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429) || status >= 500
}

/// Default wait when a 429 carries no usable `retry-after` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Turn a non-success response into the matching error
///
/// Clients send each request once; retrying is left to the caller, which
/// knows its own attempt budget.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status().as_u16();
    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        debug!(retry_after, "check_status: rate limited");
        return Err(LlmError::RateLimited {
            retry_after: Duration::from_secs(retry_after),
        });
    }
    if !response.status().is_success() {
        let message = response.text().await.unwrap_or_default();
        debug!(status, "check_status: API error");
        return Err(LlmError::ApiError { status, message });
    }
    Ok(response)
}

impl LlmError {
    /// Whether the same request may succeed later
    ///
    /// Configuration errors and rejected requests are permanent. An empty or
    /// malformed envelope is not: the next completion is usually fine.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::RateLimited { .. }
            | LlmError::Network(_)
            | LlmError::Timeout(_)
            | LlmError::InvalidResponse(_)
            | LlmError::Json(_) => true,
            LlmError::ApiError { status, .. } => is_transient_status(*status),
            LlmError::UnknownProvider(_) | LlmError::MissingApiKey(_) => false,
        }
    }

    /// Wait requested by the provider, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> LlmError {
        LlmError::ApiError {
            status,
            message: String::new(),
        }
    }

    #[test]
    fn test_transient_statuses() {
        assert!(api(408).is_retryable());
        assert!(api(429).is_retryable());
        assert!(api(502).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!api(401).is_retryable());
    }

    #[test]
    fn test_permanent_errors() {
        assert!(LlmError::Timeout(Duration::from_secs(30)).is_retryable());
        assert!(LlmError::InvalidResponse("no text".to_string()).is_retryable());
        assert!(!LlmError::UnknownProvider("mistral".to_string()).is_retryable());
        assert!(!LlmError::MissingApiKey("OPENAI_API_KEY".to_string()).is_retryable());
    }

    #[test]
    fn test_retry_after_only_for_rate_limits() {
        let err = LlmError::RateLimited {
            retry_after: Duration::from_secs(42),
        };
        assert!(err.is_retryable());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(api(503).retry_after(), None);
    }
}
