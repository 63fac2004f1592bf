//! Response validation
//!
//! Extracts the JSON object from model output, checks it against
//! [`ValidationRules`], scores it and optionally corrects it.

mod correction;
mod extract;
mod rules;
mod validator;

pub use correction::{correct_copy, correct_items, truncate_chars};
pub use extract::extract_json;
pub use rules::ValidationRules;
pub use validator::{IssueCategory, IssueCode, ResponseValidator, ValidationIssue, ValidationResult, score};
