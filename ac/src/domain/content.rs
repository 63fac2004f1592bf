//! Generated ad copy

use serde::{Deserialize, Serialize};

/// Number of titles (headlines) per ad group
pub const REQUIRED_TITLES: usize = 15;

/// Number of descriptions per ad group
pub const REQUIRED_DESCRIPTIONS: usize = 4;

/// Maximum title length in characters
pub const MAX_TITLE_LENGTH: usize = 30;

/// Maximum description length in characters
pub const MAX_DESCRIPTION_LENGTH: usize = 90;

/// Descriptions shorter than this draw a warning
pub const MIN_DESCRIPTION_LENGTH: usize = 55;

/// Titles and descriptions without provenance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdCopy {
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
}

impl AdCopy {
    /// Render as the JSON object the model is asked to produce
    pub fn to_json(&self) -> String {
        serde_json::json!({
            "titles": self.titles,
            "descriptions": self.descriptions,
        })
        .to_string()
    }
}

/// Provenance and quality information for generated content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentMetadata {
    pub model: String,
    pub industry: Option<String>,
    /// Generation timestamp (unix ms)
    pub timestamp: i64,
    /// Validator score in [0, 1]
    pub validation_score: f64,
    pub processing_time_ms: u64,
    pub retry_count: u32,
}

/// Validated content ready to be written to a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub titles: Vec<String>,
    pub descriptions: Vec<String>,
    pub metadata: ContentMetadata,
}

impl GeneratedContent {
    /// Attach metadata to validated copy
    pub fn new(copy: AdCopy, metadata: ContentMetadata) -> Self {
        Self {
            titles: copy.titles,
            descriptions: copy.descriptions,
            metadata,
        }
    }

    /// Whether the content carries the full set of titles and descriptions
    pub fn is_complete(&self) -> bool {
        self.titles.len() == REQUIRED_TITLES && self.descriptions.len() == REQUIRED_DESCRIPTIONS
    }
}
