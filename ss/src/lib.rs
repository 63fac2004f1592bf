//! SheetStore - file-backed spreadsheet storage
//!
//! Stores each sheet as a single JSON document holding a grid of string
//! cells. Reads can be restricted with A1-style ranges; writes replace the
//! whole grid atomically.
//!
//! # Layout
//!
//! ```text
//! .sheetstore/
//! ├── {sheet_id}.json     # {"title": ..., "values": [[...]], "updated_at": ...}
//! └── {sheet_id}.lock     # advisory lock taken while saving
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sheetstore::{SheetRange, SheetStore};
//!
//! let store = SheetStore::open(".sheetstore")?;
//! store.save("campaigns", vec![vec!["Campaign".into(), "Ad group".into()]])?;
//! let sheet = store.get("campaigns", &SheetRange::parse("A:Z")?)?;
//! ```

pub mod cli;
pub mod config;
mod range;
mod store;

pub use range::{RangeError, SheetRange, column_index, column_label};
pub use store::{SheetDocument, SheetId, SheetStore, SheetSummary, StoreError};

/// Default range used when callers do not specify one
pub const DEFAULT_RANGE: &str = "A:Z";
