//! Writing generated content into sheet rows

use thiserror::Error;
use tracing::{debug, warn};

use super::columns::ColumnMap;

/// Errors raised while patching a sheet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Row {row} is the header row")]
    HeaderRow { row: usize },

    #[error("Row {row} does not exist (sheet has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },
}

/// What a patch changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSummary {
    pub cells_written: usize,
    /// Slots skipped because their column is protected
    pub protected_skipped: usize,
}

/// Write titles and descriptions into one row of `values`
///
/// `values[0]` is the header row; `row_index` addresses `values` directly.
/// The row is padded to the header width first. Protected columns are
/// left untouched. Slots without content are cleared so no stale copy
/// from an earlier run survives.
pub fn patch_row(
    values: &mut [Vec<String>],
    row_index: usize,
    map: &ColumnMap,
    titles: &[String],
    descriptions: &[String],
) -> Result<PatchSummary, PatchError> {
    debug!(row_index, titles = titles.len(), descriptions = descriptions.len(), "patch_row: called");
    if row_index == 0 {
        return Err(PatchError::HeaderRow { row: row_index });
    }
    let rows = values.len();
    let width = values.first().map(Vec::len).unwrap_or_default();
    let Some(row) = values.get_mut(row_index) else {
        return Err(PatchError::RowOutOfRange { row: row_index, rows });
    };

    let slots = map.titles.iter().zip(slot_values(titles, map.titles.len())).chain(
        map.descriptions
            .iter()
            .zip(slot_values(descriptions, map.descriptions.len())),
    );

    let mut summary = PatchSummary::default();
    pad_row(row, width);
    for (column, value) in slots {
        let Some(column) = *column else {
            continue;
        };
        if map.is_protected(column) {
            warn!(row_index, column, "Refusing to write protected column");
            summary.protected_skipped += 1;
            continue;
        }
        pad_row(row, column + 1);
        row[column] = value;
        summary.cells_written += 1;
    }
    debug!(?summary, "patch_row: done");
    Ok(summary)
}

fn slot_values(items: &[String], slots: usize) -> impl Iterator<Item = String> + '_ {
    (0..slots).map(move |i| items.get(i).cloned().unwrap_or_default())
}

/// Extend `row` with empty cells up to `width`
pub fn pad_row(row: &mut Vec<String>, width: usize) {
    if row.len() < width {
        row.resize(width, String::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::columns::{ensure_columns, map_columns};

    fn sheet() -> Vec<Vec<String>> {
        vec![
            vec!["ID".to_string(), "Campaign".to_string(), "Title 1".to_string()],
            vec!["7".to_string()],
        ]
    }

    fn protected() -> Vec<String> {
        vec!["id".to_string(), "campaign".to_string()]
    }

    fn copy() -> (Vec<String>, Vec<String>) {
        let titles = (1..=15).map(|i| format!("T{}", i)).collect();
        let descriptions = (1..=4).map(|i| format!("D{}", i)).collect();
        (titles, descriptions)
    }

    #[test]
    fn test_patch_pads_and_writes() {
        let mut values = sheet();
        let mut map = map_columns(&values[0], &protected());
        ensure_columns(&mut values[0], &mut map);
        let width = values[0].len();

        let (titles, descriptions) = copy();
        let summary = patch_row(&mut values, 1, &map, &titles, &descriptions).unwrap();

        assert_eq!(summary.cells_written, 19);
        assert_eq!(summary.protected_skipped, 0);
        assert_eq!(values[1].len(), width);
        assert_eq!(values[1][0], "7");
        assert_eq!(values[1][1], "");
        assert_eq!(values[1][2], "T1");
        assert_eq!(values[1][width - 1], "D4");
    }

    #[test]
    fn test_protected_column_is_never_written() {
        let mut values = sheet();
        let mut map = map_columns(&values[0], &protected());
        // A detected slot pointing at a protected column
        map.titles[0] = Some(0);

        let (titles, descriptions) = copy();
        let summary = patch_row(&mut values, 1, &map, &titles, &descriptions).unwrap();
        assert_eq!(values[1][0], "7");
        assert_eq!(summary.protected_skipped, 1);
    }

    #[test]
    fn test_short_content_clears_remaining_slots() {
        let mut values = sheet();
        values[1] = vec!["7".to_string(), "c".to_string(), "old".to_string()];
        let map = map_columns(&values[0], &protected());

        patch_row(&mut values, 1, &map, &[], &[]).unwrap();
        assert_eq!(values[1][2], "");
    }

    #[test]
    fn test_rejects_header_and_missing_rows() {
        let mut values = sheet();
        let map = map_columns(&values[0], &protected());
        assert_eq!(
            patch_row(&mut values, 0, &map, &[], &[]),
            Err(PatchError::HeaderRow { row: 0 })
        );
        assert_eq!(
            patch_row(&mut values, 5, &map, &[], &[]),
            Err(PatchError::RowOutOfRange { row: 5, rows: 2 })
        );
    }
}
