//! Batch job types

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{GeneratedContent, GenerationRequest};

/// Lifecycle of a batch job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One row submitted to a batch
#[derive(Debug, Clone)]
pub struct JobInput {
    pub row_index: usize,
    pub request: GenerationRequest,
}

impl JobInput {
    pub fn new(row_index: usize, request: GenerationRequest) -> Self {
        Self { row_index, request }
    }
}

/// A job and its outcome
#[derive(Debug, Clone, Serialize)]
pub struct BatchJob {
    pub id: String,
    pub row_index: usize,
    #[serde(skip)]
    pub request: GenerationRequest,
    /// Retries performed after the first attempt
    pub retries: u32,
    pub status: JobStatus,
    pub result: Option<GeneratedContent>,
    pub error: Option<String>,
    pub from_cache: bool,
}

impl BatchJob {
    pub fn new(input: JobInput) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            row_index: input.row_index,
            request: input.request,
            retries: 0,
            status: JobStatus::Pending,
            result: None,
            error: None,
            from_cache: false,
        }
    }

    pub(crate) fn completed(mut self, content: GeneratedContent, retries: u32, from_cache: bool) -> Self {
        self.status = JobStatus::Completed;
        self.result = Some(content);
        self.retries = retries;
        self.from_cache = from_cache;
        self
    }

    pub(crate) fn failed(mut self, error: impl Into<String>, retries: u32) -> Self {
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        self.retries = retries;
        self
    }
}

/// Id, row and status of a registered job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub row_index: usize,
    pub status: JobStatus,
}

/// Aggregate outcome of a batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub successful: Vec<BatchJob>,
    pub failed: Vec<BatchJob>,
    #[serde(rename = "total_time_ms", serialize_with = "serialize_millis")]
    pub total_time: Duration,
    pub cache_hits: usize,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdGroupContext, CampaignContext, ClientProfile};

    fn input(row: usize) -> JobInput {
        JobInput::new(
            row,
            GenerationRequest {
                model: "gpt-4o-mini".to_string(),
                client: ClientProfile::default(),
                campaign: CampaignContext::default(),
                ad_group: AdGroupContext::default(),
                industry: None,
                target_persona: None,
                temperature: 0.7,
                max_tokens: 100,
            },
        )
    }

    #[test]
    fn test_new_job_is_pending_with_unique_id() {
        let a = BatchJob::new(input(1));
        let b = BatchJob::new(input(2));
        assert_eq!(a.status, JobStatus::Pending);
        assert_ne!(a.id, b.id);
        assert!(!a.status.is_terminal());
    }

    #[test]
    fn test_failed_records_error() {
        let job = BatchJob::new(input(1)).failed("boom", 2);
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert_eq!(job.retries, 2);
        assert!(job.status.is_terminal());
    }
}
