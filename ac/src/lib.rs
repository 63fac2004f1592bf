//! AdCopy - validated LLM generation of search-ad copy for spreadsheet rows
//!
//! Reads campaign rows from a sheet, asks an LLM for 15 titles and 4
//! descriptions per ad group, validates and corrects the reply, and writes
//! the result back into the row.
//!
//! # Modules
//!
//! - [`prompts`] - Industry-aware prompt construction
//! - [`validation`] - Response parsing, checking and correction
//! - [`cache`] - Two-tier content cache
//! - [`throttle`] - Double-click protection
//! - [`batch`] - Grouped fan-out with retries and cancellation
//! - [`orchestrator`] - Generation pipeline and sheet write-back
//! - [`sheet`] - Spreadsheet store and column mapping
//! - [`llm`] - LLM provider trait and clients
//! - [`directory`] - Client profiles
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod batch;
pub mod cache;
pub mod cli;
pub mod config;
pub mod directory;
pub mod domain;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod sheet;
pub mod throttle;
pub mod validation;

// Re-export commonly used types
pub use batch::{BatchProcessor, BatchResult, ContentGenerator, JobInput};
pub use cache::{CacheManager, cache_key};
pub use config::Config;
pub use domain::{AdCopy, GeneratedContent, GenerationRequest, LegacyGenerationOptions};
pub use llm::{LlmError, LlmProvider};
pub use orchestrator::{GenerationError, GenerationOrchestrator, GenerationPipeline};
pub use prompts::{PromptBuilder, PromptOptions, PromptVariables};
pub use sheet::{SpreadsheetStore, map_columns};
pub use throttle::ClickThrottler;
pub use validation::{ResponseValidator, ValidationResult, ValidationRules};
