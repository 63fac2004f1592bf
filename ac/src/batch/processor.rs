//! Batch processor implementation

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use super::generator::ContentGenerator;
use super::job::{BatchJob, BatchResult, JobInput, JobSnapshot, JobStatus};
use crate::cache::{CacheManager, cache_key};
use crate::config::BatchConfig;
use crate::domain::{GeneratedContent, GenerationRequest};

/// Error recorded on jobs cancelled by the user
pub const CANCELLED_BY_USER: &str = "Cancelled by user";

/// Progress callback: (rows attempted so far, total rows)
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Registry entry of a job that has not finished yet
struct ActiveJob {
    row_index: usize,
    status: JobStatus,
    cancel: watch::Sender<bool>,
}

/// Fans generation jobs out in sequential groups of bounded size
///
/// Jobs inside a group run concurrently; the next group starts only after
/// every job of the previous one settled, followed by a short pause.
pub struct BatchProcessor {
    generator: Arc<dyn ContentGenerator>,
    cache: Arc<CacheManager>,
    config: BatchConfig,
    active: Mutex<HashMap<String, ActiveJob>>,
}

impl BatchProcessor {
    pub fn new(generator: Arc<dyn ContentGenerator>, cache: Arc<CacheManager>, config: BatchConfig) -> Self {
        debug!(?config, "BatchProcessor::new: called");
        Self {
            generator,
            cache,
            config,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Process every job, returning successes and failures
    ///
    /// Never fails as a whole: each job ends either completed or failed.
    pub async fn process_batch(&self, inputs: Vec<JobInput>, on_progress: Option<ProgressCallback>) -> BatchResult {
        let total = inputs.len();
        let group_size = self.config.batch_size.max(1);
        info!(total, group_size, "Starting batch");
        let started = Instant::now();

        // Register everything up front so pending jobs can be cancelled too
        let mut jobs = Vec::with_capacity(total);
        {
            let mut active = self.active.lock().await;
            for input in inputs {
                let job = BatchJob::new(input);
                let (tx, rx) = watch::channel(false);
                active.insert(
                    job.id.clone(),
                    ActiveJob {
                        row_index: job.row_index,
                        status: JobStatus::Pending,
                        cancel: tx,
                    },
                );
                jobs.push((job, rx));
            }
        }

        let mut successful = Vec::new();
        let mut failed = Vec::new();
        let mut cache_hits = 0;
        let mut attempted = 0;
        let group_count = total.div_ceil(group_size);

        let mut remaining = jobs.into_iter();
        for group_index in 0..group_count {
            let group: Vec<_> = remaining.by_ref().take(group_size).collect();
            debug!(group_index, size = group.len(), "BatchProcessor::process_batch: starting group");
            attempted = (attempted + group.len()).min(total);

            let finished = join_all(group.into_iter().map(|(job, rx)| self.run_job(job, rx))).await;
            for job in finished {
                self.active.lock().await.remove(&job.id);
                match job.status {
                    JobStatus::Completed => {
                        if job.from_cache {
                            cache_hits += 1;
                        }
                        successful.push(job);
                    }
                    _ => failed.push(job),
                }
            }

            if let Some(callback) = &on_progress {
                callback(attempted, total);
            }

            if group_index + 1 < group_count {
                tokio::time::sleep(self.config.group_delay()).await;
            }
        }

        let total_time = started.elapsed();
        info!(
            successful = successful.len(),
            failed = failed.len(),
            cache_hits,
            elapsed_ms = total_time.as_millis() as u64,
            "Batch finished"
        );
        BatchResult {
            successful,
            failed,
            total_time,
            cache_hits,
        }
    }

    /// Run one job to a terminal state
    async fn run_job(&self, job: BatchJob, mut cancel: watch::Receiver<bool>) -> BatchJob {
        debug!(id = %job.id, row = job.row_index, "BatchProcessor::run_job: called");
        if *cancel.borrow() {
            debug!(id = %job.id, "BatchProcessor::run_job: cancelled before start");
            return job.failed(CANCELLED_BY_USER, 0);
        }

        let key = cache_key(&job.request);
        if let Some(content) = self.cache.get(&key).await {
            debug!(id = %job.id, %key, "BatchProcessor::run_job: cache hit");
            return job.completed(content, 0, true);
        }

        self.set_status(&job.id, JobStatus::Processing).await;

        let id = job.id.clone();
        let request = job.request.clone();
        tokio::select! {
            outcome = self.generate_with_retries(&id, &request) => match outcome {
                Ok((content, retries)) => {
                    if content.is_complete() {
                        self.cache.set(&key, &content, None).await;
                    }
                    job.completed(content, retries, false)
                }
                Err((error, retries)) => {
                    warn!(id = %job.id, row = job.row_index, %error, "Job failed after retries");
                    job.failed(error, retries)
                }
            },
            _ = wait_cancelled(&mut cancel) => {
                info!(id = %job.id, row = job.row_index, "Job cancelled");
                job.failed(CANCELLED_BY_USER, 0)
            }
        }
    }

    /// Retry loop with linear backoff; returns content or the last error,
    /// together with the number of retries performed
    ///
    /// Errors that cannot succeed on a second run end the loop at once.
    async fn generate_with_retries(
        &self,
        id: &str,
        request: &GenerationRequest,
    ) -> Result<(GeneratedContent, u32), (String, u32)> {
        let mut attempt = 0;
        loop {
            match self.generator.generate(request).await {
                Ok(content) => return Ok((content, attempt)),
                Err(e) if !e.is_retryable() => {
                    debug!(%id, attempt, error = %e, "BatchProcessor::generate_with_retries: permanent failure");
                    return Err((e.to_string(), attempt));
                }
                Err(e) if attempt >= self.config.max_retries => return Err((e.to_string(), attempt)),
                Err(e) => {
                    debug!(%id, attempt, error = %e, "BatchProcessor::generate_with_retries: attempt failed");
                }
            }
            attempt += 1;
            let backoff = self.config.retry_delay() * attempt;
            debug!(%id, attempt, ?backoff, "BatchProcessor::generate_with_retries: backing off");
            tokio::time::sleep(backoff).await;
        }
    }

    async fn set_status(&self, id: &str, status: JobStatus) {
        if let Some(job) = self.active.lock().await.get_mut(id) {
            job.status = status;
        }
    }

    /// Status of a job that has not finished yet
    pub async fn job_status(&self, id: &str) -> Option<JobStatus> {
        self.active.lock().await.get(id).map(|j| j.status)
    }

    /// Jobs registered and not yet finished
    pub async fn active_jobs(&self) -> Vec<JobSnapshot> {
        let active = self.active.lock().await;
        let mut jobs: Vec<JobSnapshot> = active
            .iter()
            .map(|(id, job)| JobSnapshot {
                id: id.clone(),
                row_index: job.row_index,
                status: job.status,
            })
            .collect();
        jobs.sort_by_key(|j| j.row_index);
        jobs
    }

    /// Cancel one job; it ends as failed with "Cancelled by user"
    pub async fn cancel_job(&self, id: &str) -> bool {
        debug!(%id, "BatchProcessor::cancel_job: called");
        match self.active.lock().await.remove(id) {
            Some(job) => {
                job.cancel.send_replace(true);
                info!(%id, row = job.row_index, "Cancelled job");
                true
            }
            None => {
                debug!(%id, "BatchProcessor::cancel_job: not active");
                false
            }
        }
    }

    /// Cancel every registered job, returning how many were cancelled
    pub async fn cancel_all_jobs(&self) -> usize {
        debug!("BatchProcessor::cancel_all_jobs: called");
        let drained: Vec<ActiveJob> = self.active.lock().await.drain().map(|(_, job)| job).collect();
        for job in &drained {
            job.cancel.send_replace(true);
        }
        info!(count = drained.len(), "Cancelled all jobs");
        drained.len()
    }
}

/// Resolves once the job's cancel flag is raised
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            // Sender gone without cancelling: never resolves
            std::future::pending::<()>().await;
        }
    }
}
