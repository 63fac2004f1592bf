//! Validation rules

use crate::domain::{
    MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, MIN_DESCRIPTION_LENGTH, REQUIRED_DESCRIPTIONS, REQUIRED_TITLES,
};

/// Constraints and policy applied to a raw model response
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRules {
    pub max_title_length: usize,
    pub max_description_length: usize,
    /// Shorter descriptions draw a warning, never an error
    pub min_description_length: usize,
    pub required_titles: usize,
    pub required_descriptions: usize,
    /// Length and count violations are errors instead of warnings
    pub strict_mode: bool,
    pub auto_correct: bool,
    /// Results scoring below this are never valid
    pub quality_threshold: f64,
    /// Accept corrected content even when errors were found
    pub allow_partial_results: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            max_title_length: MAX_TITLE_LENGTH,
            max_description_length: MAX_DESCRIPTION_LENGTH,
            min_description_length: MIN_DESCRIPTION_LENGTH,
            required_titles: REQUIRED_TITLES,
            required_descriptions: REQUIRED_DESCRIPTIONS,
            strict_mode: true,
            auto_correct: true,
            quality_threshold: 0.0,
            allow_partial_results: false,
        }
    }
}

impl ValidationRules {
    pub fn strict(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    pub fn auto_correct(mut self, auto_correct: bool) -> Self {
        self.auto_correct = auto_correct;
        self
    }

    pub fn allow_partial(mut self, allow_partial_results: bool) -> Self {
        self.allow_partial_results = allow_partial_results;
        self
    }
}
