//! JSON extraction from free-form model output

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

static FENCED_BLOCK: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"(?s)```[A-Za-z]*\s*(.*?)```").ok());

/// Extract the JSON object from a model response
///
/// Tries, in order: the whole text, fenced code blocks, the largest balanced
/// `{...}` span, then everything between the first `{` and the last `}`.
/// Only JSON objects are returned.
pub fn extract_json(raw: &str) -> Option<Value> {
    debug!(len = raw.len(), "extract_json: called");
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        debug!("extract_json: empty input");
        return None;
    }

    if let Some(value) = parse_object(trimmed) {
        debug!("extract_json: direct parse");
        return Some(value);
    }

    if let Some(re) = FENCED_BLOCK.as_ref() {
        for caps in re.captures_iter(trimmed) {
            if let Some(value) = caps.get(1).and_then(|m| parse_object(m.as_str().trim())) {
                debug!("extract_json: fenced code block");
                return Some(value);
            }
        }
    }

    let mut spans = balanced_spans(trimmed);
    spans.sort_by_key(|(start, end)| std::cmp::Reverse(end - start));
    for (start, end) in spans {
        if let Some(value) = parse_object(&trimmed[start..end]) {
            debug!(start, end, "extract_json: balanced span");
            return Some(value);
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Some(value) = parse_object(&trimmed[start..=end]) {
                debug!("extract_json: outer braces");
                return Some(value);
            }
        }
    }

    debug!("extract_json: no JSON object found");
    None
}

fn parse_object(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value) if value.is_object() => Some(value),
        _ => None,
    }
}

/// Byte ranges of top-level `{...}` spans, ignoring braces inside strings
fn balanced_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = idx;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push((start, idx + 1));
                }
            }
            _ => {}
        }
    }
    spans
}
