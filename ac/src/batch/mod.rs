//! Batch generation
//!
//! Fans out many rows in bounded groups with per-job retries, progress
//! reporting and cooperative cancellation.

pub mod generator;
mod job;
mod processor;

pub use generator::ContentGenerator;
pub use job::{BatchJob, BatchResult, JobInput, JobSnapshot, JobStatus};
pub use processor::{BatchProcessor, CANCELLED_BY_USER, ProgressCallback};
