//! Spreadsheet access and row patching

mod columns;
mod patch;
mod store;

pub use columns::{ColumnMap, DEFAULT_PROTECTED_HEADERS, InputColumns, ensure_columns, map_columns};
pub use patch::{PatchError, PatchSummary, pad_row, patch_row};
pub use store::{InMemorySheetStore, LocalSheetStore, SheetData, SpreadsheetStore, StoreError};
