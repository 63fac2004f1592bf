//! Generation orchestrator
//!
//! The boundary between callers and the pipeline: throttles repeated
//! triggers, fills rows, saves the sheet, and turns every failure into an
//! outcome value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::GenerationError;
use super::pipeline::GenerationPipeline;
use crate::batch::{BatchProcessor, ContentGenerator, JobInput, JobSnapshot, ProgressCallback};
use crate::cache::{CacheManager, CacheStats, cache_key};
use crate::config::Config;
use crate::domain::{GeneratedContent, GenerationRequest};
use crate::llm::LlmProvider;
use crate::prompts::PromptBuilder;
use crate::sheet::{ColumnMap, PatchError, SpreadsheetStore, ensure_columns, map_columns, patch_row};
use crate::throttle::{ClickThrottler, row_key, rows_key};

/// Result of a single-row generation
#[derive(Debug, Clone, Default, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    /// The sheet as saved
    pub updated_sheet_data: Option<Vec<Vec<String>>>,
    pub content: Option<GeneratedContent>,
    pub from_cache: bool,
    pub error: Option<String>,
}

impl SaveOutcome {
    fn failure(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}

/// Per-row entry of a multi-row generation
#[derive(Debug, Clone, Serialize)]
pub struct RowResult {
    pub row_index: usize,
    pub success: bool,
    pub content: Option<GeneratedContent>,
    pub from_cache: bool,
    pub retries: u32,
    pub error: Option<String>,
}

/// Result of a multi-row generation
///
/// `success` means at least one row was filled and the sheet was saved;
/// failed rows are listed in `results`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub success: bool,
    pub results: Vec<RowResult>,
    #[serde(rename = "total_time_ms", serialize_with = "serialize_millis")]
    pub total_time: Duration,
    pub cache_hits: usize,
    pub updated_sheet_data: Option<Vec<Vec<String>>>,
    pub error: Option<String>,
}

impl BatchOutcome {
    fn failure(error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// Shared state moved into throttled calls
struct Inner {
    generator: Arc<dyn ContentGenerator>,
    cache: Arc<CacheManager>,
    store: Arc<dyn SpreadsheetStore>,
    batch: BatchProcessor,
    protected_headers: Vec<String>,
}

/// Top-level entry point for generating and saving ad copy
pub struct GenerationOrchestrator {
    inner: Arc<Inner>,
    single: ClickThrottler<SaveOutcome>,
    multi: ClickThrottler<BatchOutcome>,
    saves: ClickThrottler<Result<bool, String>>,
}

impl GenerationOrchestrator {
    /// Assemble an orchestrator from explicit collaborators
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        cache: Arc<CacheManager>,
        store: Arc<dyn SpreadsheetStore>,
        config: &Config,
    ) -> Self {
        debug!("GenerationOrchestrator::new: called");
        let batch = BatchProcessor::new(generator.clone(), cache.clone(), config.batch.clone());
        Self {
            inner: Arc::new(Inner {
                generator,
                cache,
                store,
                batch,
                protected_headers: config.sheet.protected_headers.clone(),
            }),
            single: ClickThrottler::new(config.throttle.clone()),
            multi: ClickThrottler::new(config.throttle.clone()),
            saves: ClickThrottler::new(config.throttle.clone()),
        }
    }

    /// Orchestrator over the generation pipeline and a cache built from config
    pub fn from_config(
        config: &Config,
        provider: Arc<dyn LlmProvider>,
        prompts: PromptBuilder,
        store: Arc<dyn SpreadsheetStore>,
    ) -> Self {
        debug!("GenerationOrchestrator::from_config: called");
        let pipeline = GenerationPipeline::new(provider, prompts, config.generation.clone());
        let cache = Arc::new(CacheManager::new(&config.cache));
        Self::new(Arc::new(pipeline), cache, store, config)
    }

    /// Generate content for one row and save the sheet
    ///
    /// `row_index` addresses `current_sheet_data`, whose first row holds the
    /// headers. Never fails: errors come back in the outcome.
    pub async fn generate_and_save_content(
        &self,
        request: GenerationRequest,
        sheet_id: &str,
        row_index: usize,
        current_sheet_data: Vec<Vec<String>>,
    ) -> SaveOutcome {
        debug!(%sheet_id, row_index, "GenerationOrchestrator::generate_and_save_content: called");
        let key = row_key(sheet_id, row_index);
        let inner = self.inner.clone();
        let sheet_id = sheet_id.to_string();
        let call = move || async move {
            match inner.generate_row(request, &sheet_id, row_index, current_sheet_data).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(%sheet_id, row_index, error = %e, "Row generation failed");
                    SaveOutcome::failure(e)
                }
            }
        };
        match self.single.throttle_generation(&key, call).await {
            Ok(outcome) => outcome,
            Err(e) => SaveOutcome::failure(GenerationError::from(e)),
        }
    }

    /// Generate content for several rows and save the sheet once
    pub async fn generate_content_for_multiple_rows(
        &self,
        rows: Vec<JobInput>,
        sheet_id: &str,
        current_sheet_data: Vec<Vec<String>>,
        on_progress: Option<ProgressCallback>,
    ) -> BatchOutcome {
        debug!(%sheet_id, rows = rows.len(), "GenerationOrchestrator::generate_content_for_multiple_rows: called");
        let indices: Vec<usize> = rows.iter().map(|r| r.row_index).collect();
        let key = rows_key(sheet_id, &indices);
        let inner = self.inner.clone();
        let sheet_id = sheet_id.to_string();
        let call = move || async move {
            match inner.generate_rows(rows, &sheet_id, current_sheet_data, on_progress).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(%sheet_id, error = %e, "Batch generation failed");
                    BatchOutcome::failure(e)
                }
            }
        };
        match self.multi.throttle_generation(&key, call).await {
            Ok(outcome) => outcome,
            Err(e) => BatchOutcome::failure(GenerationError::from(e)),
        }
    }

    /// Save a sheet on behalf of a user action, throttled per sheet
    pub async fn save_sheet(&self, sheet_id: &str, values: Vec<Vec<String>>) -> Result<bool, String> {
        debug!(%sheet_id, "GenerationOrchestrator::save_sheet: called");
        let key = format!("save_{}", sheet_id);
        let store = self.inner.store.clone();
        let sheet_id = sheet_id.to_string();
        let call = move || async move { store.save_sheet_data(&sheet_id, &values).await.map_err(|e| e.to_string()) };
        match self.saves.throttle_save(&key, call).await {
            Ok(saved) => saved,
            Err(e) => Err(e.to_string()),
        }
    }

    /// Jobs of the running batch
    pub async fn active_jobs(&self) -> Vec<JobSnapshot> {
        self.inner.batch.active_jobs().await
    }

    pub async fn cancel_job(&self, id: &str) -> bool {
        self.inner.batch.cancel_job(id).await
    }

    pub async fn cancel_all_jobs(&self) -> usize {
        self.inner.batch.cancel_all_jobs().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats().await
    }
}

impl Inner {
    async fn generate_row(
        &self,
        request: GenerationRequest,
        sheet_id: &str,
        row_index: usize,
        mut values: Vec<Vec<String>>,
    ) -> Result<SaveOutcome, GenerationError> {
        debug!(%sheet_id, row_index, "Inner::generate_row: called");
        let map = self.prepare_columns(sheet_id, &mut values)?;
        check_row(&values, row_index)?;

        let key = cache_key(&request);
        let (content, from_cache) = match self.cache.get(&key).await {
            Some(content) => {
                debug!(%key, "Inner::generate_row: cache hit");
                (content, true)
            }
            None => {
                let content = self.generator.generate(&request).await?;
                if content.is_complete() {
                    self.cache.set(&key, &content, None).await;
                } else {
                    debug!(%key, "Inner::generate_row: partial content, not cached");
                }
                (content, false)
            }
        };

        patch_row(&mut values, row_index, &map, &content.titles, &content.descriptions)?;
        self.save(sheet_id, &values).await?;
        info!(%sheet_id, row_index, from_cache, "Saved generated content");

        Ok(SaveOutcome {
            success: true,
            updated_sheet_data: Some(values),
            content: Some(content),
            from_cache,
            error: None,
        })
    }

    async fn generate_rows(
        &self,
        rows: Vec<JobInput>,
        sheet_id: &str,
        mut values: Vec<Vec<String>>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<BatchOutcome, GenerationError> {
        debug!(%sheet_id, rows = rows.len(), "Inner::generate_rows: called");
        let started = Instant::now();
        let map = self.prepare_columns(sheet_id, &mut values)?;

        // Rows outside the sheet fail up front instead of spending a job
        let (rows, invalid): (Vec<JobInput>, Vec<JobInput>) =
            rows.into_iter().partition(|r| check_row(&values, r.row_index).is_ok());
        let mut results: Vec<RowResult> = invalid
            .into_iter()
            .filter_map(|r| check_row(&values, r.row_index).err().map(|e| (r.row_index, e)))
            .map(|(row_index, e)| RowResult {
                row_index,
                success: false,
                content: None,
                from_cache: false,
                retries: 0,
                error: Some(e.to_string()),
            })
            .collect();

        let batch = self.batch.process_batch(rows, on_progress).await;

        let mut filled = 0;
        for job in batch.successful {
            let Some(content) = job.result else {
                continue;
            };
            let row = match patch_row(&mut values, job.row_index, &map, &content.titles, &content.descriptions) {
                Ok(_) => {
                    filled += 1;
                    RowResult {
                        row_index: job.row_index,
                        success: true,
                        content: Some(content),
                        from_cache: job.from_cache,
                        retries: job.retries,
                        error: None,
                    }
                }
                Err(e) => RowResult {
                    row_index: job.row_index,
                    success: false,
                    content: None,
                    from_cache: job.from_cache,
                    retries: job.retries,
                    error: Some(e.to_string()),
                },
            };
            results.push(row);
        }
        results.extend(batch.failed.into_iter().map(|job| RowResult {
            row_index: job.row_index,
            success: false,
            content: None,
            from_cache: false,
            retries: job.retries,
            error: job.error,
        }));
        results.sort_by_key(|r| r.row_index);

        let mut outcome = BatchOutcome {
            success: false,
            results,
            total_time: Duration::ZERO,
            cache_hits: batch.cache_hits,
            updated_sheet_data: None,
            error: None,
        };

        if filled == 0 {
            outcome.error = Some(format!("No row could be generated ({} failed)", outcome.results.len()));
        } else {
            match self.save(sheet_id, &values).await {
                Ok(()) => {
                    info!(%sheet_id, filled, "Saved batch results");
                    outcome.success = true;
                    outcome.updated_sheet_data = Some(values);
                }
                Err(e) => {
                    warn!(%sheet_id, error = %e, "Failed to save batch results");
                    outcome.error = Some(e.to_string());
                }
            }
        }
        outcome.total_time = started.elapsed();
        Ok(outcome)
    }

    /// Map the header row, appending any missing output columns
    fn prepare_columns(&self, sheet_id: &str, values: &mut [Vec<String>]) -> Result<ColumnMap, GenerationError> {
        let Some(headers) = values.first_mut() else {
            return Err(GenerationError::MissingHeader(sheet_id.to_string()));
        };
        let mut map = map_columns(headers.as_slice(), &self.protected_headers);
        let added = ensure_columns(headers, &mut map);
        if added > 0 {
            info!(%sheet_id, added, "Added output columns to sheet");
        }
        Ok(map)
    }

    async fn save(&self, sheet_id: &str, values: &[Vec<String>]) -> Result<(), GenerationError> {
        if self.store.save_sheet_data(sheet_id, values).await? {
            Ok(())
        } else {
            Err(GenerationError::SaveRejected)
        }
    }
}

/// Reject the header row and rows past the end of the sheet
fn check_row(values: &[Vec<String>], row_index: usize) -> Result<(), PatchError> {
    if row_index == 0 {
        return Err(PatchError::HeaderRow { row: row_index });
    }
    if row_index >= values.len() {
        return Err(PatchError::RowOutOfRange {
            row: row_index,
            rows: values.len(),
        });
    }
    Ok(())
}
