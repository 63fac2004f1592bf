//! Generation orchestration
//!
//! The pipeline turns one request into validated content; the orchestrator
//! drives it for sheet rows and owns the batch, cache and throttle state.

mod core;
mod error;
mod pipeline;
mod state;

pub use self::core::{BatchOutcome, GenerationOrchestrator, RowResult, SaveOutcome};
pub use error::GenerationError;
pub use pipeline::{GenerationPipeline, PipelineRun};
pub use state::{AttemptState, AttemptTrace};
