//! Header analysis
//!
//! Locates the title and description columns of a sheet by matching header
//! names, and the input columns (campaign, ad group, keywords) used to build
//! requests from rows. Nothing here touches cell values.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::domain::{LegacyGenerationOptions, REQUIRED_DESCRIPTIONS, REQUIRED_TITLES};

/// Header keywords whose columns are never written
pub const DEFAULT_PROTECTED_HEADERS: &[&str] = &[
    "id",
    "summary",
    "résumé",
    "campaign",
    "campagne",
    "ad group",
    "adgroup",
    "groupe d'annonces",
    "keyword",
    "keywords",
    "mots-clés",
];

const TITLE_MARKERS: &[&str] = &["titre", "title", "headline"];
const DESCRIPTION_MARKERS: &[&str] = &["description", "desc"];

const CAMPAIGN_HEADERS: &[&str] = &["campaign", "campagne"];
const AD_GROUP_HEADERS: &[&str] = &["ad group", "adgroup", "groupe d'annonces", "groupe"];
const KEYWORD_HEADERS: &[&str] = &["keyword", "keywords", "mots-clés", "mots clés"];

/// Where each title and description slot lives in the sheet
///
/// `None` marks a slot with no matching column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    pub titles: Vec<Option<usize>>,
    pub descriptions: Vec<Option<usize>>,
    /// Column indices that must never be overwritten
    pub protected: BTreeSet<usize>,
}

impl ColumnMap {
    fn empty() -> Self {
        Self {
            titles: vec![None; REQUIRED_TITLES],
            descriptions: vec![None; REQUIRED_DESCRIPTIONS],
            protected: BTreeSet::new(),
        }
    }

    /// Title slots (zero-based) without a column
    pub fn missing_titles(&self) -> Vec<usize> {
        missing(&self.titles)
    }

    /// Description slots (zero-based) without a column
    pub fn missing_descriptions(&self) -> Vec<usize> {
        missing(&self.descriptions)
    }

    /// Every slot has a column
    pub fn is_complete(&self) -> bool {
        self.titles.iter().chain(&self.descriptions).all(Option::is_some)
    }

    pub fn is_protected(&self, column: usize) -> bool {
        self.protected.contains(&column)
    }
}

fn missing(slots: &[Option<usize>]) -> Vec<usize> {
    slots
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_none())
        .map(|(i, _)| i)
        .collect()
}

/// Match headers to title and description slots
///
/// Headers are compared case-insensitively: a header containing `titre`,
/// `title` or `headline` is a title column, one containing `description` or
/// `desc` a description column. A trailing number (`Title 7`) pins the
/// column to that slot; unnumbered columns fill the remaining slots left to
/// right. Protected headers are recorded and never matched.
pub fn map_columns<S: AsRef<str>>(headers: &[S], protected_keywords: &[String]) -> ColumnMap {
    debug!(headers = headers.len(), "map_columns: called");
    let mut map = ColumnMap::empty();
    let mut titles = Vec::new();
    let mut descriptions = Vec::new();

    for (index, header) in headers.iter().enumerate() {
        let header = header.as_ref();
        let header_tokens = tokens(header);
        if protected_keywords.iter().any(|k| matches_phrase(&header_tokens, k)) {
            debug!(index, %header, "map_columns: protected column");
            map.protected.insert(index);
            continue;
        }

        let lower = header.to_lowercase();
        if TITLE_MARKERS.iter().any(|m| lower.contains(m)) {
            titles.push((index, trailing_number(header)));
        } else if DESCRIPTION_MARKERS.iter().any(|m| lower.contains(m)) {
            descriptions.push((index, trailing_number(header)));
        }
    }

    assign_slots(&mut map.titles, &titles);
    assign_slots(&mut map.descriptions, &descriptions);
    debug!(
        missing_titles = map.missing_titles().len(),
        missing_descriptions = map.missing_descriptions().len(),
        protected = map.protected.len(),
        "map_columns: done"
    );
    map
}

fn assign_slots(slots: &mut [Option<usize>], candidates: &[(usize, Option<usize>)]) {
    let mut leftovers = Vec::new();
    for &(column, number) in candidates {
        match number {
            Some(n) if (1..=slots.len()).contains(&n) && slots[n - 1].is_none() => slots[n - 1] = Some(column),
            _ => leftovers.push(column),
        }
    }
    for column in leftovers {
        match slots.iter_mut().find(|s| s.is_none()) {
            Some(slot) => *slot = Some(column),
            None => break,
        }
    }
}

/// Append headers for every slot without a column
///
/// The sheet only ever grows: existing headers keep their position. Returns
/// the number of headers added.
pub fn ensure_columns(headers: &mut Vec<String>, map: &mut ColumnMap) -> usize {
    debug!(headers = headers.len(), "ensure_columns: called");
    let mut added = 0;
    for slot in map.missing_titles() {
        map.titles[slot] = Some(headers.len());
        headers.push(format!("Title {}", slot + 1));
        added += 1;
    }
    for slot in map.missing_descriptions() {
        map.descriptions[slot] = Some(headers.len());
        headers.push(format!("Description {}", slot + 1));
        added += 1;
    }
    if added > 0 {
        debug!(added, "ensure_columns: widened header row");
    }
    added
}

/// Columns holding the request inputs of each row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InputColumns {
    pub campaign: Option<usize>,
    pub ad_group: Option<usize>,
    pub keywords: Option<usize>,
}

impl InputColumns {
    /// First header matching each input
    pub fn locate<S: AsRef<str>>(headers: &[S]) -> Self {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| matches_phrase(&tokens(h.as_ref()), n)))
        };
        let columns = Self {
            campaign: find(CAMPAIGN_HEADERS),
            ad_group: find(AD_GROUP_HEADERS),
            keywords: find(KEYWORD_HEADERS),
        };
        debug!(?columns, "InputColumns::locate: called");
        columns
    }

    /// Cell of `row` for an optional column, blank cells as `None`
    pub fn cell(row: &[String], column: Option<usize>) -> Option<String> {
        column
            .and_then(|c| row.get(c))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Option bag for one data row
    pub fn options_for(&self, row: &[String]) -> LegacyGenerationOptions {
        LegacyGenerationOptions {
            campaign: Self::cell(row, self.campaign),
            ad_group: Self::cell(row, self.ad_group),
            keywords: Self::cell(row, self.keywords),
            ..Default::default()
        }
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the keyword's words appear consecutively in the header's words
fn matches_phrase(header_tokens: &[String], keyword: &str) -> bool {
    let keyword = tokens(keyword);
    !keyword.is_empty() && header_tokens.windows(keyword.len()).any(|w| w == keyword.as_slice())
}

fn trailing_number(header: &str) -> Option<usize> {
    let digits: String = header
        .trim_end()
        .chars()
        .rev()
        .take_while(char::is_ascii_digit)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protected() -> Vec<String> {
        DEFAULT_PROTECTED_HEADERS.iter().map(|s| s.to_string()).collect()
    }

    fn full_headers() -> Vec<String> {
        let mut headers = vec!["Campaign".to_string(), "Ad Group".to_string(), "Keywords".to_string()];
        headers.extend((1..=15).map(|i| format!("Title {}", i)));
        headers.extend((1..=4).map(|i| format!("Description {}", i)));
        headers
    }

    #[test]
    fn test_maps_numbered_headers() {
        let map = map_columns(&full_headers(), &protected());
        assert!(map.is_complete());
        assert_eq!(map.titles[0], Some(3));
        assert_eq!(map.titles[14], Some(17));
        assert_eq!(map.descriptions[0], Some(18));
        assert_eq!(map.descriptions[3], Some(21));
        assert_eq!(map.protected, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn test_french_and_headline_headers() {
        let headers = ["Titre 2", "Headline 1", "Desc 1", "Mots-clés"];
        let map = map_columns(&headers, &protected());
        assert_eq!(map.titles[0], Some(1));
        assert_eq!(map.titles[1], Some(0));
        assert_eq!(map.descriptions[0], Some(2));
        assert!(map.is_protected(3));
    }

    #[test]
    fn test_unnumbered_headers_fill_free_slots() {
        let headers = ["Title", "Title 1", "Title"];
        let map = map_columns(&headers, &[]);
        assert_eq!(map.titles[0], Some(1));
        assert_eq!(map.titles[1], Some(0));
        assert_eq!(map.titles[2], Some(2));
        assert_eq!(map.missing_titles().len(), 12);
    }

    #[test]
    fn test_protected_header_never_detected() {
        // "Title ID" would otherwise match as a title column
        let headers = ["Title ID", "Title 1", "Campaign description"];
        let map = map_columns(&headers, &protected());
        assert_eq!(map.titles[0], Some(1));
        assert!(!map.titles.contains(&Some(0)));
        assert!(map.is_protected(0));
        assert!(map.is_protected(2));
        assert_eq!(map.descriptions[0], None);
    }

    #[test]
    fn test_id_matches_whole_word_only() {
        let headers = ["Guide title"];
        let map = map_columns(&headers, &protected());
        assert!(map.protected.is_empty());
        assert_eq!(map.titles[0], Some(0));
    }

    #[test]
    fn test_ensure_columns_appends_missing() {
        let mut headers = vec!["Campaign".to_string(), "Title 1".to_string(), "Description 2".to_string()];
        let mut map = map_columns(&headers, &protected());
        let added = ensure_columns(&mut headers, &mut map);

        assert_eq!(added, 14 + 3);
        assert_eq!(headers.len(), 3 + 17);
        assert_eq!(&headers[..3], &["Campaign", "Title 1", "Description 2"]);
        assert_eq!(headers[3], "Title 2");
        assert!(map.is_complete());
        assert_eq!(map.descriptions[1], Some(2));
        assert_eq!(headers[map.descriptions[0].unwrap()], "Description 1");
        assert_eq!(ensure_columns(&mut headers, &mut map), 0);
    }

    #[test]
    fn test_input_columns() {
        let headers = full_headers();
        let columns = InputColumns::locate(&headers);
        assert_eq!(columns.campaign, Some(0));
        assert_eq!(columns.ad_group, Some(1));
        assert_eq!(columns.keywords, Some(2));

        let row = vec!["Spring".to_string(), "  ".to_string()];
        assert_eq!(InputColumns::cell(&row, columns.campaign).as_deref(), Some("Spring"));
        assert_eq!(InputColumns::cell(&row, columns.ad_group), None);
        assert_eq!(InputColumns::cell(&row, columns.keywords), None);

        let options = columns.options_for(&["Spring".to_string(), "Trail".to_string(), "a, b".to_string()]);
        assert_eq!(options.campaign.as_deref(), Some("Spring"));
        assert_eq!(options.ad_group.as_deref(), Some("Trail"));
        assert_eq!(options.keywords.as_deref(), Some("a, b"));
    }

    #[test]
    fn test_trailing_number() {
        assert_eq!(trailing_number("Title 12"), Some(12));
        assert_eq!(trailing_number("Headline7 "), Some(7));
        assert_eq!(trailing_number("Title"), None);
    }
}
