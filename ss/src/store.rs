//! Core SheetStore implementation

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::range::{RangeError, SheetRange};

/// Identifier of a sheet within the store
pub type SheetId = String;

/// Errors raised by the sheet store
///
/// `NotFound` is deliberately distinct from a sheet that exists but has no rows.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Sheet not found: {0}")]
    NotFound(String),

    #[error("Invalid sheet id '{0}': use letters, digits, '-' or '_'")]
    InvalidId(String),

    #[error("Invalid range: {0}")]
    Range(#[from] RangeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A persisted sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SheetDocument {
    /// Human-readable title
    #[serde(default)]
    pub title: Option<String>,
    /// Row-major grid of cells
    #[serde(default)]
    pub values: Vec<Vec<String>>,
    /// Last write timestamp (unix ms)
    #[serde(default)]
    pub updated_at: i64,
}

/// Listing entry for a sheet
#[derive(Debug, Clone)]
pub struct SheetSummary {
    pub id: SheetId,
    pub title: Option<String>,
    pub rows: usize,
    pub columns: usize,
    pub updated_at: i64,
}

/// The main sheet store
pub struct SheetStore {
    /// Base path for storage
    base_path: PathBuf,
}

impl SheetStore {
    /// Open or create a sheet store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        debug!(?base_path, "Opened sheet store");
        Ok(Self { base_path })
    }

    /// Base directory of this store
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn sheet_path(&self, sheet_id: &str) -> Result<PathBuf, StoreError> {
        validate_id(sheet_id)?;
        Ok(self.base_path.join(format!("{}.json", sheet_id)))
    }

    /// Check whether a sheet exists
    pub fn exists(&self, sheet_id: &str) -> bool {
        self.sheet_path(sheet_id).map(|p| p.exists()).unwrap_or(false)
    }

    /// Load a sheet, restricted to the given range
    pub fn get(&self, sheet_id: &str, range: &SheetRange) -> Result<SheetDocument, StoreError> {
        debug!(%sheet_id, ?range, "SheetStore::get: called");
        let mut doc = self.load(sheet_id)?;
        doc.values = range.apply(&doc.values);
        Ok(doc)
    }

    /// Load a full sheet
    pub fn load(&self, sheet_id: &str) -> Result<SheetDocument, StoreError> {
        let path = self.sheet_path(sheet_id)?;
        if !path.exists() {
            debug!(%sheet_id, "SheetStore::load: missing");
            return Err(StoreError::NotFound(sheet_id.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let doc: SheetDocument = serde_json::from_str(&content)?;
        debug!(%sheet_id, rows = doc.values.len(), "SheetStore::load: loaded");
        Ok(doc)
    }

    /// Replace the values of a sheet, creating it if necessary
    ///
    /// The existing title is kept. The write goes to a temporary file that is
    /// renamed over the target while an exclusive lock is held.
    pub fn save(&self, sheet_id: &str, values: Vec<Vec<String>>) -> Result<(), StoreError> {
        debug!(%sheet_id, rows = values.len(), "SheetStore::save: called");
        let title = match self.load(sheet_id) {
            Ok(doc) => doc.title,
            Err(StoreError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        self.write(sheet_id, SheetDocument {
            title,
            values,
            updated_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Create or overwrite a sheet including its title
    pub fn put(&self, sheet_id: &str, title: Option<String>, values: Vec<Vec<String>>) -> Result<(), StoreError> {
        debug!(%sheet_id, ?title, "SheetStore::put: called");
        self.write(sheet_id, SheetDocument {
            title,
            values,
            updated_at: chrono::Utc::now().timestamp_millis(),
        })
    }

    fn write(&self, sheet_id: &str, doc: SheetDocument) -> Result<(), StoreError> {
        let path = self.sheet_path(sheet_id)?;
        let lock_path = self.base_path.join(format!("{}.lock", sheet_id));
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        lock.lock_exclusive()?;

        let tmp_path = self.base_path.join(format!(".{}.json.tmp", sheet_id));
        let result = (|| -> Result<(), StoreError> {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(serde_json::to_string_pretty(&doc)?.as_bytes())?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, &path)?;
            Ok(())
        })();

        FileExt::unlock(&lock)?;
        if result.is_ok() {
            info!(%sheet_id, rows = doc.values.len(), "Sheet saved");
        }
        result
    }

    /// List all sheets in the store
    pub fn list(&self) -> Result<Vec<SheetSummary>, StoreError> {
        let pattern = self.base_path.join("*.json");
        let pattern = pattern.to_string_lossy();
        let mut sheets = Vec::new();

        for entry in glob::glob(&pattern).map_err(|e| std::io::Error::other(e.to_string()))? {
            let path = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let doc = self.load(id)?;
            sheets.push(SheetSummary {
                id: id.to_string(),
                title: doc.title,
                rows: doc.values.len(),
                columns: doc.values.iter().map(Vec::len).max().unwrap_or(0),
                updated_at: doc.updated_at,
            });
        }

        sheets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sheets)
    }

    /// Delete a sheet
    pub fn delete(&self, sheet_id: &str) -> Result<(), StoreError> {
        let path = self.sheet_path(sheet_id)?;
        if !path.exists() {
            return Err(StoreError::NotFound(sheet_id.to_string()));
        }
        fs::remove_file(&path)?;
        let lock_path = self.base_path.join(format!("{}.lock", sheet_id));
        if lock_path.exists() {
            fs::remove_file(lock_path)?;
        }
        info!(%sheet_id, "Sheet deleted");
        Ok(())
    }
}

fn validate_id(sheet_id: &str) -> Result<(), StoreError> {
    let valid = !sheet_id.is_empty()
        && sheet_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidId(sheet_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_save_and_get() {
        let temp = TempDir::new().unwrap();
        let store = SheetStore::open(temp.path().join("store")).unwrap();

        store
            .save("campaigns", vec![row(&["Campaign", "Ad group"]), row(&["Shoes", "Trail"])])
            .unwrap();

        let doc = store.get("campaigns", &SheetRange::parse("A:Z").unwrap()).unwrap();
        assert_eq!(doc.values.len(), 2);
        assert_eq!(doc.values[1][1], "Trail");
        assert!(doc.updated_at > 0);
    }

    #[test]
    fn test_missing_sheet_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = SheetStore::open(temp.path()).unwrap();

        let result = store.get("nope", &SheetRange::default());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_empty_sheet_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let store = SheetStore::open(temp.path()).unwrap();

        store.save("empty", vec![]).unwrap();
        let doc = store.get("empty", &SheetRange::default()).unwrap();
        assert!(doc.values.is_empty());
    }

    #[test]
    fn test_save_keeps_title() {
        let temp = TempDir::new().unwrap();
        let store = SheetStore::open(temp.path()).unwrap();

        store
            .put("s1", Some("Spring launch".to_string()), vec![row(&["a"])])
            .unwrap();
        store.save("s1", vec![row(&["b"])]).unwrap();

        let doc = store.load("s1").unwrap();
        assert_eq!(doc.title.as_deref(), Some("Spring launch"));
        assert_eq!(doc.values, vec![row(&["b"])]);
    }

    #[test]
    fn test_invalid_id_rejected() {
        let temp = TempDir::new().unwrap();
        let store = SheetStore::open(temp.path()).unwrap();

        assert!(matches!(store.save("../escape", vec![]), Err(StoreError::InvalidId(_))));
        assert!(!store.exists("../escape"));
    }

    #[test]
    fn test_list_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = SheetStore::open(temp.path()).unwrap();

        store.save("b", vec![row(&["x", "y", "z"])]).unwrap();
        store.save("a", vec![row(&["x"]), row(&["y"])]).unwrap();

        let sheets = store.list().unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].id, "a");
        assert_eq!(sheets[0].rows, 2);
        assert_eq!(sheets[1].columns, 3);

        store.delete("a").unwrap();
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(matches!(store.delete("a"), Err(StoreError::NotFound(_))));
    }
}
