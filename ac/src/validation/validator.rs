//! Response validator
//!
//! Parses raw model output, checks counts and lengths, scores the result and
//! auto-corrects when allowed. Malformed input never panics or errors: every
//! problem is reported in the returned [`ValidationResult`].

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::ValidationRules;
use super::correction::correct_copy;
use super::extract::extract_json;
use crate::domain::AdCopy;

/// Call-to-action vocabulary (English and French copy)
static CALL_TO_ACTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(shop|buy|order|get|book|call|contact|discover|learn|try|start|join|visit|request|sign up|subscribe|download|save|apply|enrol|enroll|schedule|explore|compare|find|see|découvrez|contactez|commandez|réservez|achetez|profitez|essayez|demandez|appelez|inscrivez|obtenez)\b",
    )
    .ok()
});

const WARNING_PENALTY: f64 = 0.02;
const STRUCTURE_BONUS: f64 = 0.1;

/// Broad class of a validation issue, used for scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    Structure,
    Length,
    Content,
    Format,
}

impl IssueCategory {
    /// Score deduction for an error of this category
    pub fn penalty(&self) -> f64 {
        match self {
            Self::Structure => 0.3,
            Self::Length => 0.1,
            Self::Content => 0.2,
            Self::Format => 0.05,
        }
    }
}

/// Specific validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    InvalidJson,
    MissingArray,
    InvalidItem,
    TooLong,
    TooShort,
    MissingCallToAction,
    Duplicate,
    WrongCount,
}

impl IssueCode {
    pub fn category(&self) -> IssueCategory {
        match self {
            Self::InvalidJson | Self::MissingArray => IssueCategory::Structure,
            Self::TooLong => IssueCategory::Length,
            Self::InvalidItem | Self::TooShort | Self::MissingCallToAction | Self::Duplicate => IssueCategory::Content,
            Self::WrongCount => IssueCategory::Format,
        }
    }
}

/// A single error or warning
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    /// `titles`, `descriptions` or `response`
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    fn new(code: IssueCode, field: &str, message: impl Into<String>) -> Self {
        Self {
            code,
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> IssueCategory {
        self.code.category()
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Outcome of validating one raw response
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Quality score in [0, 1]
    pub score: f64,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
    /// Trimmed string items, when both arrays were present
    pub content: Option<AdCopy>,
    pub corrected_content: Option<AdCopy>,
    pub suggestions: Vec<String>,
}

impl ValidationResult {
    /// Corrected content if any, otherwise the content as received
    pub fn final_content(&self) -> Option<&AdCopy> {
        self.corrected_content.as_ref().or(self.content.as_ref())
    }

    /// All error messages joined for reporting
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn has_structural_error(&self) -> bool {
        self.errors.iter().any(|e| e.category() == IssueCategory::Structure)
    }
}

/// Validates and corrects model responses against a rule set
#[derive(Debug, Clone, Default)]
pub struct ResponseValidator {
    rules: ValidationRules,
}

impl ResponseValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// Validate a raw response and correct it when allowed
    pub fn validate_and_correct(&self, raw: &str) -> ValidationResult {
        debug!(len = raw.len(), strict = self.rules.strict_mode, "ResponseValidator::validate_and_correct: called");
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let Some(value) = extract_json(raw) else {
            debug!("ResponseValidator::validate_and_correct: no JSON object");
            errors.push(ValidationIssue::new(
                IssueCode::InvalidJson,
                "response",
                "Response does not contain a valid JSON object",
            ));
            return self.finish(errors, warnings, false, None, None);
        };

        let titles = value.get("titles").and_then(Value::as_array);
        let descriptions = value.get("descriptions").and_then(Value::as_array);
        let (titles, descriptions) = match (titles, descriptions) {
            (Some(t), Some(d)) => (t, d),
            (titles, descriptions) => {
                debug!("ResponseValidator::validate_and_correct: missing arrays");
                if titles.is_none() {
                    errors.push(ValidationIssue::new(
                        IssueCode::MissingArray,
                        "titles",
                        "Response has no \"titles\" array",
                    ));
                }
                if descriptions.is_none() {
                    errors.push(ValidationIssue::new(
                        IssueCode::MissingArray,
                        "descriptions",
                        "Response has no \"descriptions\" array",
                    ));
                }
                return self.finish(errors, warnings, false, None, None);
            }
        };

        self.check_items("titles", "Title", titles, self.rules.max_title_length, &mut errors, &mut warnings);
        self.check_items(
            "descriptions",
            "Description",
            descriptions,
            self.rules.max_description_length,
            &mut errors,
            &mut warnings,
        );
        self.check_descriptions(descriptions, &mut warnings);
        self.check_count("titles", titles.len(), self.rules.required_titles, &mut errors, &mut warnings);
        self.check_count(
            "descriptions",
            descriptions.len(),
            self.rules.required_descriptions,
            &mut errors,
            &mut warnings,
        );

        let content = AdCopy {
            titles: string_items(titles),
            descriptions: string_items(descriptions),
        };

        // Constraint warnings are corrected too, so overflow is never kept silently
        let needs_correction = !errors.is_empty()
            || warnings
                .iter()
                .any(|w| matches!(w.code, IssueCode::TooLong | IssueCode::WrongCount));

        let corrected = if self.rules.auto_correct && needs_correction {
            let corrected = correct_copy(titles, descriptions, &self.rules);
            if corrected.titles.is_empty() && corrected.descriptions.is_empty() {
                debug!("ResponseValidator::validate_and_correct: correction left nothing");
                None
            } else {
                debug!(
                    titles = corrected.titles.len(),
                    descriptions = corrected.descriptions.len(),
                    "ResponseValidator::validate_and_correct: corrected"
                );
                Some(corrected)
            }
        } else {
            None
        };

        self.finish(errors, warnings, true, Some(content), corrected)
    }

    fn check_items(
        &self,
        field: &str,
        label: &str,
        items: &[Value],
        max_len: usize,
        errors: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) {
        let mut seen = HashSet::new();
        for (idx, item) in items.iter().enumerate() {
            let n = idx + 1;
            let text = match item.as_str().map(str::trim) {
                Some(text) if !text.is_empty() => text,
                _ => {
                    errors.push(ValidationIssue::new(
                        IssueCode::InvalidItem,
                        field,
                        format!("{} {} is empty or not a string", label, n),
                    ));
                    continue;
                }
            };

            let len = text.chars().count();
            if len > max_len {
                let issue = ValidationIssue::new(
                    IssueCode::TooLong,
                    field,
                    format!("{} {} is {} characters (max {})", label, n, len, max_len),
                );
                if self.rules.strict_mode {
                    errors.push(issue);
                } else {
                    warnings.push(issue);
                }
            }

            if !seen.insert(text.to_lowercase()) {
                warnings.push(ValidationIssue::new(
                    IssueCode::Duplicate,
                    field,
                    format!("{} {} duplicates an earlier entry", label, n),
                ));
            }
        }
    }

    fn check_descriptions(&self, descriptions: &[Value], warnings: &mut Vec<ValidationIssue>) {
        for (idx, text) in descriptions
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_str().map(|s| (i, s.trim())))
            .filter(|(_, s)| !s.is_empty())
        {
            let n = idx + 1;
            let len = text.chars().count();
            if len < self.rules.min_description_length {
                warnings.push(ValidationIssue::new(
                    IssueCode::TooShort,
                    "descriptions",
                    format!(
                        "Description {} is only {} characters (min {})",
                        n, len, self.rules.min_description_length
                    ),
                ));
            }
            if let Some(re) = CALL_TO_ACTION.as_ref() {
                if !re.is_match(text) {
                    warnings.push(ValidationIssue::new(
                        IssueCode::MissingCallToAction,
                        "descriptions",
                        format!("Description {} has no call to action", n),
                    ));
                }
            }
        }
    }

    fn check_count(
        &self,
        field: &str,
        actual: usize,
        required: usize,
        errors: &mut Vec<ValidationIssue>,
        warnings: &mut Vec<ValidationIssue>,
    ) {
        if actual == required {
            return;
        }
        let issue = ValidationIssue::new(
            IssueCode::WrongCount,
            field,
            format!("Received {} instead of {} {}", actual, required, field),
        );
        if self.rules.strict_mode {
            errors.push(issue);
        } else {
            warnings.push(issue);
        }
    }

    fn finish(
        &self,
        errors: Vec<ValidationIssue>,
        warnings: Vec<ValidationIssue>,
        arrays_present: bool,
        content: Option<AdCopy>,
        corrected_content: Option<AdCopy>,
    ) -> ValidationResult {
        let score = score(&errors, &warnings, arrays_present);
        let accepted = errors.is_empty() || (corrected_content.is_some() && self.rules.allow_partial_results);
        let is_valid = accepted && score >= self.rules.quality_threshold;
        let suggestions = self.suggestions(&errors, &warnings);

        info!(
            is_valid,
            score,
            errors = errors.len(),
            warnings = warnings.len(),
            corrected = corrected_content.is_some(),
            "Validated response"
        );

        ValidationResult {
            is_valid,
            score,
            errors,
            warnings,
            content,
            corrected_content,
            suggestions,
        }
    }

    fn suggestions(&self, errors: &[ValidationIssue], warnings: &[ValidationIssue]) -> Vec<String> {
        let mut seen = HashSet::new();
        errors
            .iter()
            .chain(warnings)
            .filter(|issue| seen.insert(suggestion_group(issue.code)))
            .map(|issue| self.suggestion(issue.code))
            .collect()
    }

    fn suggestion(&self, code: IssueCode) -> String {
        let rules = &self.rules;
        match code {
            IssueCode::InvalidJson | IssueCode::MissingArray => {
                "Return a single JSON object with \"titles\" and \"descriptions\" arrays and no surrounding prose"
                    .to_string()
            }
            IssueCode::TooLong => format!(
                "Keep titles within {} characters and descriptions within {} characters",
                rules.max_title_length, rules.max_description_length
            ),
            IssueCode::WrongCount => format!(
                "Provide exactly {} titles and {} descriptions",
                rules.required_titles, rules.required_descriptions
            ),
            IssueCode::InvalidItem => "Replace empty or non-text entries with real ad copy".to_string(),
            IssueCode::TooShort => format!(
                "Expand descriptions to at least {} characters",
                rules.min_description_length
            ),
            IssueCode::MissingCallToAction => "End each description with a clear call to action".to_string(),
            IssueCode::Duplicate => "Vary the wording so every title and description is unique".to_string(),
        }
    }
}

/// Trimmed string items, non-strings skipped
fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .collect()
}

/// Codes sharing one suggestion
fn suggestion_group(code: IssueCode) -> IssueCode {
    match code {
        IssueCode::MissingArray => IssueCode::InvalidJson,
        other => other,
    }
}

/// Quality score: start at 1, deduct per error category and per warning,
/// reward a well-formed structure, clamp to [0, 1]
pub fn score(errors: &[ValidationIssue], warnings: &[ValidationIssue], arrays_present: bool) -> f64 {
    let mut score = 1.0;
    score -= errors.iter().map(|e| e.category().penalty()).sum::<f64>();
    score -= warnings.len() as f64 * WARNING_PENALTY;
    if arrays_present {
        score += STRUCTURE_BONUS;
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn titles(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Running Shoes Deal {}", i + 1)).collect()
    }

    fn descriptions(n: usize) -> Vec<String> {
        (0..n)
            .map(|i| format!("Shop lightweight trail and road running shoes today, offer number {}.", i + 1))
            .collect()
    }

    fn response(titles: &[String], descriptions: &[String]) -> String {
        json!({ "titles": titles, "descriptions": descriptions }).to_string()
    }

    #[test]
    fn test_valid_response() {
        let raw = response(&titles(15), &descriptions(4));
        let result = ResponseValidator::default().validate_and_correct(&raw);

        assert!(result.is_valid, "{:?}", result.errors);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        assert_eq!(result.score, 1.0);
        assert!(result.corrected_content.is_none());
        assert_eq!(result.final_content().unwrap().titles.len(), 15);
    }

    #[test]
    fn test_fenced_response_with_long_title_is_truncated() {
        let mut t = titles(15);
        t[3] = "Ultra Cushioned Marathon Shoes 2025".to_string();
        assert_eq!(t[3].chars().count(), 35);
        let raw = format!("Here you go:\n```json\n{}\n```", response(&t, &descriptions(4)));

        let result = ResponseValidator::default().validate_and_correct(&raw);

        let length_errors: Vec<_> = result.errors.iter().filter(|e| e.code == IssueCode::TooLong).collect();
        assert_eq!(length_errors.len(), 1);
        assert!(length_errors[0].message.contains("Title 4 is 35 characters"));
        assert!(!result.is_valid);

        let corrected = result.corrected_content.as_ref().unwrap();
        assert_eq!(corrected.titles[3], "Ultra Cushioned Marathon Shoes");
        assert!(corrected.titles.iter().all(|t| t.chars().count() <= 30));
        assert_eq!(corrected.titles.len(), 15);
    }

    #[test]
    fn test_short_title_list_strict() {
        let raw = response(&titles(10), &descriptions(4));
        let rules = ValidationRules::default().allow_partial(false);
        let result = ResponseValidator::new(rules).validate_and_correct(&raw);

        assert!(!result.is_valid);
        assert!(result.errors.iter().any(|e| e.message.contains("10 instead of 15")));
        // Correction never pads
        assert_eq!(result.corrected_content.as_ref().unwrap().titles.len(), 10);
    }

    #[test]
    fn test_partial_results_accepted_when_allowed() {
        let raw = response(&titles(10), &descriptions(4));
        let rules = ValidationRules::default().allow_partial(true);
        let result = ResponseValidator::new(rules).validate_and_correct(&raw);

        assert!(result.is_valid);
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn test_non_strict_turns_constraints_into_warnings() {
        let mut t = titles(15);
        t[0] = "x".repeat(40);
        let raw = response(&t, &descriptions(3));
        let rules = ValidationRules::default().strict(false);
        let result = ResponseValidator::new(rules).validate_and_correct(&raw);

        assert!(result.errors.is_empty());
        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.code == IssueCode::TooLong));
        assert!(result.warnings.iter().any(|w| w.code == IssueCode::WrongCount));
        // Overflow is still corrected
        assert_eq!(result.final_content().unwrap().titles[0].len(), 30);
    }

    #[test]
    fn test_structural_errors() {
        let result = ResponseValidator::default().validate_and_correct("I cannot help with that");
        assert!(!result.is_valid);
        assert!(result.has_structural_error());
        assert!(result.content.is_none());
        assert!(result.corrected_content.is_none());
        assert!((result.score - 0.7).abs() < 1e-9);

        let result = ResponseValidator::default().validate_and_correct(r#"{"titles": "nope"}"#);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().all(|e| e.code == IssueCode::MissingArray));
        assert!((result.score - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_structural_error_not_rescued_by_partial() {
        let rules = ValidationRules::default().allow_partial(true);
        let result = ResponseValidator::new(rules).validate_and_correct("no json here");
        assert!(!result.is_valid);
    }

    #[test]
    fn test_content_warnings() {
        let mut d = descriptions(4);
        d[0] = "Too short.".to_string();
        d[1] = "A perfectly long description that never asks the reader to act in any way.".to_string();
        let mut t = titles(15);
        t[5] = t[4].to_uppercase();
        let raw = response(&t, &d);

        let result = ResponseValidator::default().validate_and_correct(&raw);

        assert!(result.errors.is_empty());
        assert!(result.is_valid);
        let codes: Vec<_> = result.warnings.iter().map(|w| w.code).collect();
        assert!(codes.contains(&IssueCode::TooShort));
        assert!(codes.contains(&IssueCode::MissingCallToAction));
        assert!(codes.contains(&IssueCode::Duplicate));
        assert!(result.suggestions.iter().any(|s| s.contains("call to action")));
    }

    #[test]
    fn test_invalid_items_are_content_errors() {
        let mut raw: Value = serde_json::from_str(&response(&titles(15), &descriptions(4))).unwrap();
        raw["titles"][2] = json!(7);
        raw["titles"][3] = json!("   ");
        let result = ResponseValidator::default().validate_and_correct(&raw.to_string());

        let invalid: Vec<_> = result
            .errors
            .iter()
            .filter(|e| e.code == IssueCode::InvalidItem)
            .collect();
        assert_eq!(invalid.len(), 2);
        assert_eq!(result.corrected_content.as_ref().unwrap().titles.len(), 13);
    }

    #[test]
    fn test_score_formula() {
        let errors = vec![
            ValidationIssue::new(IssueCode::TooLong, "titles", "a"),
            ValidationIssue::new(IssueCode::WrongCount, "titles", "b"),
        ];
        let warnings = vec![ValidationIssue::new(IssueCode::Duplicate, "titles", "c")];
        let s = score(&errors, &warnings, true);
        assert!((s - (1.0 - 0.1 - 0.05 - 0.02 + 0.1_f64).min(1.0)).abs() < 1e-9);
        assert_eq!(score(&[], &[], true), 1.0);
        let many: Vec<_> = (0..10)
            .map(|_| ValidationIssue::new(IssueCode::InvalidJson, "response", "x"))
            .collect();
        assert_eq!(score(&many, &[], false), 0.0);
    }

    #[test]
    fn test_quality_threshold() {
        let mut d = descriptions(4);
        for item in d.iter_mut() {
            *item = "Short one.".to_string();
        }
        let raw = response(&titles(15), &d);
        let rules = ValidationRules {
            quality_threshold: 0.99,
            ..Default::default()
        };
        let result = ResponseValidator::new(rules).validate_and_correct(&raw);
        assert!(result.errors.is_empty());
        assert!(!result.is_valid);
    }

    #[test]
    fn test_suggestions_deduplicated() {
        let mut t = titles(15);
        t[0] = "x".repeat(31);
        t[1] = "y".repeat(31);
        let raw = response(&t, &descriptions(4));
        let result = ResponseValidator::default().validate_and_correct(&raw);
        let length: Vec<_> = result
            .suggestions
            .iter()
            .filter(|s| s.starts_with("Keep titles within"))
            .collect();
        assert_eq!(length.len(), 1);
    }
}
