//! Durable cache tier
//!
//! Entries are stored as JSON through a [`DurableBackend`]. Backend failures
//! surface as [`DurableError`]; the cache manager downgrades them to misses.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

use super::entry::CacheEntry;

/// Durable tier errors
#[derive(Debug, Error)]
pub enum DurableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Durable store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value storage behind the durable tier
#[async_trait]
pub trait DurableBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, DurableError>;
    async fn put(&self, key: &str, value: &str) -> Result<(), DurableError>;
    async fn remove(&self, key: &str) -> Result<(), DurableError>;
    async fn keys(&self) -> Result<Vec<String>, DurableError>;
}

/// One JSON file per key in a directory
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(?dir, "FileBackend::new: called");
        Self { dir }
    }

    fn path(&self, key: &str) -> Result<PathBuf, DurableError> {
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            return Err(DurableError::Unavailable(format!("unsupported key '{}'", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl DurableBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, DurableError> {
        let path = self.path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DurableError> {
        let path = self.path(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!(".{}.json.tmp", key));
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DurableError> {
        let path = self.path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>, DurableError> {
        let mut dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut keys = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(key) = name.strip_suffix(".json") {
                if !key.starts_with('.') {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// In-process backend, used when no cache directory is configured
#[derive(Default)]
pub struct MemoryBackend {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, DurableError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), DurableError> {
        self.values.lock().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), DurableError> {
        self.values.lock().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, DurableError> {
        let mut keys: Vec<String> = self.values.lock().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Durable tier with TTL expiry and newest-first retention
pub struct DurableTier {
    backend: Arc<dyn DurableBackend>,
    ttl: Duration,
    max_entries: usize,
}

impl DurableTier {
    pub fn new(backend: Arc<dyn DurableBackend>, ttl: Duration, max_entries: usize) -> Self {
        debug!(?ttl, %max_entries, "DurableTier::new: called");
        Self {
            backend,
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Read an unexpired entry; expired entries are removed
    pub async fn get(&self, key: &str, now: i64) -> Result<Option<CacheEntry>, DurableError> {
        let Some(raw) = self.backend.get(key).await? else {
            debug!(%key, "DurableTier::get: miss");
            return Ok(None);
        };
        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(%key, "DurableTier::get: corrupt entry, removing");
                self.backend.remove(key).await?;
                return Err(e.into());
            }
        };
        if entry.is_expired(now) {
            debug!(%key, "DurableTier::get: expired");
            self.backend.remove(key).await?;
            return Ok(None);
        }
        debug!(%key, "DurableTier::get: hit");
        Ok(Some(entry))
    }

    /// Store an entry, then trim to the most recent `max_entries`
    pub async fn set(&self, entry: &CacheEntry) -> Result<(), DurableError> {
        debug!(key = %entry.key, "DurableTier::set: called");
        let raw = serde_json::to_string(entry)?;
        self.backend.put(&entry.key, &raw).await?;
        self.enforce_capacity().await
    }

    async fn enforce_capacity(&self) -> Result<(), DurableError> {
        let keys = self.backend.keys().await?;
        if keys.len() <= self.max_entries {
            return Ok(());
        }

        let mut stamped = Vec::with_capacity(keys.len());
        for key in keys {
            let timestamp = match self.backend.get(&key).await? {
                Some(raw) => serde_json::from_str::<CacheEntry>(&raw)
                    .map(|e| e.timestamp)
                    .unwrap_or(i64::MIN),
                None => continue,
            };
            stamped.push((timestamp, key));
        }
        stamped.sort_by(|a, b| b.0.cmp(&a.0));

        let excess = stamped.split_off(self.max_entries.min(stamped.len()));
        debug!(evicted = excess.len(), "DurableTier::enforce_capacity: trimming");
        for (_, key) in excess {
            self.backend.remove(&key).await?;
        }
        Ok(())
    }

    /// Number of stored entries, expired included
    pub async fn len(&self) -> Result<usize, DurableError> {
        Ok(self.backend.keys().await?.len())
    }

    pub async fn clear(&self) -> Result<(), DurableError> {
        for key in self.backend.keys().await? {
            self.backend.remove(&key).await?;
        }
        Ok(())
    }

    /// Remove expired and unreadable entries, returning how many were dropped
    pub async fn purge_expired(&self, now: i64) -> Result<usize, DurableError> {
        let mut removed = 0;
        for key in self.backend.keys().await? {
            let stale = match self.backend.get(&key).await? {
                Some(raw) => serde_json::from_str::<CacheEntry>(&raw)
                    .map(|e| e.is_expired(now))
                    .unwrap_or(true),
                None => false,
            };
            if stale {
                self.backend.remove(&key).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
