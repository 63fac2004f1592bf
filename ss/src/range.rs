//! A1-style range parsing
//!
//! Supports whole-column ranges (`A:Z`), bounded ranges (`A1:C10`),
//! open-ended ranges (`B2:D`) and an optional `Sheet!` prefix which is ignored.

use thiserror::Error;
use tracing::debug;

/// Errors raised while parsing a range expression
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Empty range expression")]
    Empty,

    #[error("Invalid cell reference: '{0}'")]
    InvalidReference(String),

    #[error("Range end precedes start: '{0}'")]
    Inverted(String),
}

/// A rectangular region of a sheet, zero-based and inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetRange {
    pub start_col: usize,
    pub end_col: Option<usize>,
    pub start_row: usize,
    pub end_row: Option<usize>,
}

impl Default for SheetRange {
    fn default() -> Self {
        Self {
            start_col: 0,
            end_col: None,
            start_row: 0,
            end_row: None,
        }
    }
}

impl SheetRange {
    /// Parse an A1-style range expression
    pub fn parse(expr: &str) -> Result<Self, RangeError> {
        debug!(%expr, "SheetRange::parse: called");
        let expr = expr.trim();
        let expr = match expr.rsplit_once('!') {
            Some((_, rest)) => {
                debug!("SheetRange::parse: stripping sheet prefix");
                rest
            }
            None => expr,
        };

        if expr.is_empty() {
            debug!("SheetRange::parse: empty expression");
            return Err(RangeError::Empty);
        }

        let (start, end) = match expr.split_once(':') {
            Some((s, e)) => (s, Some(e)),
            None => (expr, None),
        };

        let (start_col, start_row) = parse_cell(start)?;
        let start_col = start_col.ok_or_else(|| RangeError::InvalidReference(start.to_string()))?;

        let (end_col, end_row) = match end {
            Some(e) => {
                let (col, row) = parse_cell(e)?;
                (Some(col.unwrap_or(usize::MAX)), row)
            }
            None => {
                debug!("SheetRange::parse: single cell reference");
                (Some(start_col), start_row)
            }
        };

        let range = Self {
            start_col,
            end_col: end_col.filter(|c| *c != usize::MAX),
            start_row: start_row.unwrap_or(0),
            end_row,
        };

        if range.end_col.is_some_and(|c| c < range.start_col) || range.end_row.is_some_and(|r| r < range.start_row) {
            debug!(?range, "SheetRange::parse: inverted range");
            return Err(RangeError::Inverted(expr.to_string()));
        }

        Ok(range)
    }

    /// Cut the given grid down to this range
    ///
    /// Rows shorter than the range are returned as-is; no padding is added.
    pub fn apply(&self, values: &[Vec<String>]) -> Vec<Vec<String>> {
        debug!(?self, row_count = values.len(), "SheetRange::apply: called");
        values
            .iter()
            .enumerate()
            .skip(self.start_row)
            .take_while(|(idx, _)| self.end_row.is_none_or(|end| *idx <= end))
            .map(|(_, row)| {
                let end = self.end_col.map(|c| c + 1).unwrap_or(row.len()).min(row.len());
                if self.start_col >= end {
                    Vec::new()
                } else {
                    row[self.start_col..end].to_vec()
                }
            })
            .collect()
    }
}

/// Split a reference like `AB12` into (column, row), both zero-based
fn parse_cell(cell: &str) -> Result<(Option<usize>, Option<usize>), RangeError> {
    let cell = cell.trim();
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &cell[letters.len()..];

    if letters.is_empty() && digits.is_empty() {
        return Err(RangeError::InvalidReference(cell.to_string()));
    }

    let col = if letters.is_empty() {
        None
    } else {
        Some(column_index(&letters).ok_or_else(|| RangeError::InvalidReference(cell.to_string()))?)
    };

    let row = if digits.is_empty() {
        None
    } else {
        let n: usize = digits
            .parse()
            .map_err(|_| RangeError::InvalidReference(cell.to_string()))?;
        if n == 0 {
            return Err(RangeError::InvalidReference(cell.to_string()));
        }
        Some(n - 1)
    };

    Ok((col, row))
}

/// Convert a column label (`A`, `Z`, `AA`) into a zero-based index
pub fn column_index(label: &str) -> Option<usize> {
    if label.is_empty() {
        return None;
    }
    let mut index = 0usize;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        let value = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        index = index.checked_mul(26)?.checked_add(value)?;
    }
    Some(index - 1)
}

/// Convert a zero-based column index into its label
pub fn column_label(mut index: usize) -> String {
    let mut label = Vec::new();
    loop {
        label.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    label.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Vec<String>> {
        (0..4)
            .map(|r| (0..5).map(|c| format!("{}{}", column_label(c), r + 1)).collect())
            .collect()
    }

    #[test]
    fn test_column_index_and_label() {
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("z"), Some(25));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index("A1"), None);
        assert_eq!(column_label(0), "A");
        assert_eq!(column_label(25), "Z");
        assert_eq!(column_label(26), "AA");
        assert_eq!(column_label(701), "ZZ");
    }

    #[test]
    fn test_parse_whole_columns() {
        let range = SheetRange::parse("A:Z").unwrap();
        assert_eq!(range.start_col, 0);
        assert_eq!(range.end_col, Some(25));
        assert_eq!(range.start_row, 0);
        assert_eq!(range.end_row, None);
    }

    #[test]
    fn test_parse_bounded_with_sheet_prefix() {
        let range = SheetRange::parse("Campaigns!B2:C3").unwrap();
        assert_eq!(range.start_col, 1);
        assert_eq!(range.end_col, Some(2));
        assert_eq!(range.start_row, 1);
        assert_eq!(range.end_row, Some(2));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SheetRange::parse(""), Err(RangeError::Empty));
        assert!(matches!(SheetRange::parse("C:A"), Err(RangeError::Inverted(_))));
        assert!(matches!(SheetRange::parse("A0:B"), Err(RangeError::InvalidReference(_))));
        assert!(matches!(SheetRange::parse("?:B"), Err(RangeError::InvalidReference(_))));
    }

    #[test]
    fn test_apply_restricts_columns_and_rows() {
        let range = SheetRange::parse("B2:C3").unwrap();
        let cut = range.apply(&grid());
        assert_eq!(cut, vec![vec!["B2", "C2"], vec!["B3", "C3"]]);
    }

    #[test]
    fn test_apply_does_not_pad_short_rows() {
        let values = vec![vec!["a".to_string()], vec!["b".to_string(), "c".to_string()]];
        let cut = SheetRange::parse("A:Z").unwrap().apply(&values);
        assert_eq!(cut, values);
    }
}
