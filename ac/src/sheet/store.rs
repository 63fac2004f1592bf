//! Spreadsheet Store collaborator

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use sheetstore::{SheetRange, SheetStore};
use tokio::sync::RwLock;
use tracing::debug;

pub use sheetstore::StoreError;

/// Cells returned for a sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetData {
    pub values: Vec<Vec<String>>,
    pub title: Option<String>,
}

/// Reads and writes whole sheets
///
/// A missing sheet is [`StoreError::NotFound`]; a sheet without rows is an
/// empty [`SheetData`]. Saves replace the whole grid, so anything that is
/// saved back must come from [`SpreadsheetStore::get_full_sheet`].
#[async_trait]
pub trait SpreadsheetStore: Send + Sync {
    async fn get_sheet_data(&self, sheet_id: &str, range: &str) -> Result<SheetData, StoreError>;

    /// Every row and column of the sheet
    async fn get_full_sheet(&self, sheet_id: &str) -> Result<SheetData, StoreError>;

    async fn save_sheet_data(&self, sheet_id: &str, values: &[Vec<String>]) -> Result<bool, StoreError>;
}

/// [`SpreadsheetStore`] over a local `sheetstore` directory
pub struct LocalSheetStore {
    store: Arc<SheetStore>,
}

impl LocalSheetStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        debug!(path = %path.as_ref().display(), "LocalSheetStore::open: called");
        Ok(Self {
            store: Arc::new(SheetStore::open(path)?),
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    StoreError::Io(std::io::Error::other(e))
}

#[async_trait]
impl SpreadsheetStore for LocalSheetStore {
    async fn get_sheet_data(&self, sheet_id: &str, range: &str) -> Result<SheetData, StoreError> {
        debug!(%sheet_id, %range, "LocalSheetStore::get_sheet_data: called");
        let range = SheetRange::parse(range)?;
        let store = self.store.clone();
        let id = sheet_id.to_string();
        let doc = tokio::task::spawn_blocking(move || store.get(&id, &range))
            .await
            .map_err(join_error)??;
        Ok(SheetData {
            values: doc.values,
            title: doc.title,
        })
    }

    async fn get_full_sheet(&self, sheet_id: &str) -> Result<SheetData, StoreError> {
        debug!(%sheet_id, "LocalSheetStore::get_full_sheet: called");
        let store = self.store.clone();
        let id = sheet_id.to_string();
        let doc = tokio::task::spawn_blocking(move || store.load(&id))
            .await
            .map_err(join_error)??;
        Ok(SheetData {
            values: doc.values,
            title: doc.title,
        })
    }

    async fn save_sheet_data(&self, sheet_id: &str, values: &[Vec<String>]) -> Result<bool, StoreError> {
        debug!(%sheet_id, rows = values.len(), "LocalSheetStore::save_sheet_data: called");
        let store = self.store.clone();
        let id = sheet_id.to_string();
        let values = values.to_vec();
        tokio::task::spawn_blocking(move || store.save(&id, values))
            .await
            .map_err(join_error)??;
        Ok(true)
    }
}

/// In-process [`SpreadsheetStore`]
///
/// Counts saves and can be told to fail them, which makes it the store of
/// choice for exercising the orchestrator.
#[derive(Default)]
pub struct InMemorySheetStore {
    sheets: RwLock<HashMap<String, SheetData>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl InMemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, sheet_id: &str, values: Vec<Vec<String>>) {
        self.sheets
            .write()
            .await
            .insert(sheet_id.to_string(), SheetData { values, title: None });
    }

    pub async fn values(&self, sheet_id: &str) -> Option<Vec<Vec<String>>> {
        self.sheets.read().await.get(sheet_id).map(|s| s.values.clone())
    }

    /// Number of successful saves
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SpreadsheetStore for InMemorySheetStore {
    async fn get_sheet_data(&self, sheet_id: &str, range: &str) -> Result<SheetData, StoreError> {
        debug!(%sheet_id, %range, "InMemorySheetStore::get_sheet_data: called");
        let range = SheetRange::parse(range)?;
        let sheets = self.sheets.read().await;
        let sheet = sheets
            .get(sheet_id)
            .ok_or_else(|| StoreError::NotFound(sheet_id.to_string()))?;
        Ok(SheetData {
            values: range.apply(&sheet.values),
            title: sheet.title.clone(),
        })
    }

    async fn get_full_sheet(&self, sheet_id: &str) -> Result<SheetData, StoreError> {
        debug!(%sheet_id, "InMemorySheetStore::get_full_sheet: called");
        self.sheets
            .read()
            .await
            .get(sheet_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(sheet_id.to_string()))
    }

    async fn save_sheet_data(&self, sheet_id: &str, values: &[Vec<String>]) -> Result<bool, StoreError> {
        debug!(%sheet_id, rows = values.len(), "InMemorySheetStore::save_sheet_data: called");
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("store unavailable")));
        }
        let mut sheets = self.sheets.write().await;
        let entry = sheets.entry(sheet_id.to_string()).or_default();
        entry.values = values.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}
