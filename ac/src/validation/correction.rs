//! Auto-correction of titles and descriptions
//!
//! Correction only removes or shortens: it never pads a short list.

use std::collections::HashSet;

use serde_json::Value;
use tracing::debug;

use super::ValidationRules;
use crate::domain::AdCopy;

/// Correct both arrays of a parsed response
pub fn correct_copy(titles: &[Value], descriptions: &[Value], rules: &ValidationRules) -> AdCopy {
    debug!(titles = titles.len(), descriptions = descriptions.len(), "correct_copy: called");
    AdCopy {
        titles: correct_items(titles, rules.max_title_length, rules.required_titles),
        descriptions: correct_items(descriptions, rules.max_description_length, rules.required_descriptions),
    }
}

/// Filter, trim, truncate, de-duplicate, then slice to `required`
pub fn correct_items(items: &[Value], max_len: usize, required: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    let corrected: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| truncate_chars(s, max_len))
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(required)
        .collect();
    debug!(input = items.len(), output = corrected.len(), "correct_items: done");
    corrected
}

/// Cut to at most `max` characters, dropping trailing whitespace left by the cut
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    cut.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("Chaussures été", 30), "Chaussures été");
        assert_eq!(truncate_chars("ééééé", 3), "ééé");
        assert_eq!(truncate_chars("Run fast today", 4), "Run");
    }

    #[test]
    fn test_correct_items_pipeline() {
        let items = vec![
            json!("  Fast Shipping  "),
            json!(42),
            json!(""),
            json!("fast shipping"),
            json!("A title that is far too long for the limit"),
            json!("Third"),
        ];
        let corrected = correct_items(&items, 29, 3);
        assert_eq!(
            corrected,
            vec!["Fast Shipping", "A title that is far too long", "Third"]
        );
    }

    #[test]
    fn test_correct_items_never_pads() {
        let items: Vec<Value> = (0..10).map(|i| json!(format!("Title {}", i))).collect();
        assert_eq!(correct_items(&items, 30, 15).len(), 10);
    }

    #[test]
    fn test_correct_items_slices_extra() {
        let items: Vec<Value> = (0..20).map(|i| json!(format!("Title {}", i))).collect();
        let corrected = correct_items(&items, 30, 15);
        assert_eq!(corrected.len(), 15);
        assert_eq!(corrected[14], "Title 14");
    }

    #[test]
    fn test_truncation_collisions_deduplicated() {
        let items = vec![json!("Same prefix here A"), json!("Same prefix here B")];
        assert_eq!(correct_items(&items, 16, 4), vec!["Same prefix here"]);
    }
}
