//! Two-tier content cache

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::durable::{DurableBackend, DurableTier, FileBackend, MemoryBackend};
use super::entry::{CacheEntry, now_ms};
use super::memory::MemoryTier;
use crate::config::CacheConfig;
use crate::domain::GeneratedContent;

/// Cache statistics snapshot
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    /// Percentage of requests served from either tier
    pub hit_rate: f64,
    pub memory_entries: usize,
    /// None when the durable tier could not be read
    pub durable_entries: Option<usize>,
}

/// Memoizes generated content per request fingerprint
///
/// Lookups try the memory tier, then the durable tier; a durable hit is
/// promoted back into memory. Durable failures are logged and treated as
/// misses so caching never fails a generation.
pub struct CacheManager {
    enabled: bool,
    memory: Mutex<MemoryTier>,
    durable: DurableTier,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheManager {
    /// Create a cache from configuration
    pub fn new(config: &CacheConfig) -> Self {
        let backend: Arc<dyn DurableBackend> = match &config.durable_dir {
            Some(dir) => Arc::new(FileBackend::new(dir.clone())),
            None => Arc::new(MemoryBackend::new()),
        };
        Self::with_backend(config, backend)
    }

    /// Create a cache over a specific durable backend
    pub fn with_backend(config: &CacheConfig, backend: Arc<dyn DurableBackend>) -> Self {
        debug!(enabled = config.enabled, "CacheManager::with_backend: called");
        Self {
            enabled: config.enabled,
            memory: Mutex::new(MemoryTier::new(config.memory_ttl(), config.memory_max_entries)),
            durable: DurableTier::new(backend, config.durable_ttl(), config.durable_max_entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// In-memory cache for tests and one-off runs
    pub fn in_memory() -> Self {
        let config = CacheConfig {
            durable_dir: None,
            ..Default::default()
        };
        Self::new(&config)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up content by key
    pub async fn get(&self, key: &str) -> Option<GeneratedContent> {
        debug!(%key, "CacheManager::get: called");
        if !self.enabled {
            debug!("CacheManager::get: cache disabled");
            return None;
        }
        let now = now_ms();

        if let Some(data) = self.memory.lock().await.get(key, now) {
            debug!(%key, "CacheManager::get: memory hit");
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Some(data);
        }

        match self.durable.get(key, now).await {
            Ok(Some(entry)) => {
                debug!(%key, "CacheManager::get: durable hit, promoting");
                self.memory.lock().await.set(key, entry.data.clone(), None, now);
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.data)
            }
            Ok(None) => {
                debug!(%key, "CacheManager::get: miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Err(e) => {
                warn!(%key, error = %e, "Durable cache read failed, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store content in both tiers; `ttl` overrides the memory tier TTL
    pub async fn set(&self, key: &str, data: &GeneratedContent, ttl: Option<Duration>) {
        debug!(%key, ?ttl, "CacheManager::set: called");
        if !self.enabled {
            debug!("CacheManager::set: cache disabled");
            return;
        }
        let now = now_ms();

        self.memory.lock().await.set(key, data.clone(), ttl, now);

        let entry = CacheEntry::new(key, data.clone(), self.durable.ttl().as_millis() as u64, now);
        if let Err(e) = self.durable.set(&entry).await {
            warn!(%key, error = %e, "Durable cache write failed, continuing with memory tier only");
        }
    }

    /// Counters and tier sizes
    pub async fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total_requests = hits + misses;
        let hit_rate = if total_requests == 0 {
            0.0
        } else {
            hits as f64 / total_requests as f64 * 100.0
        };
        let memory_entries = self.memory.lock().await.len();
        let durable_entries = match self.durable.len().await {
            Ok(n) => Some(n),
            Err(e) => {
                warn!(error = %e, "Durable cache size unavailable");
                None
            }
        };
        CacheStats {
            hits,
            misses,
            total_requests,
            hit_rate,
            memory_entries,
            durable_entries,
        }
    }

    /// Empty both tiers and reset counters
    pub async fn clear(&self) {
        debug!("CacheManager::clear: called");
        self.memory.lock().await.clear();
        if let Err(e) = self.durable.clear().await {
            warn!(error = %e, "Durable cache clear failed");
        }
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        info!("Cache cleared");
    }

    /// Drop expired entries from both tiers
    pub async fn purge_expired(&self) -> usize {
        let now = now_ms();
        let memory = self.memory.lock().await.purge_expired(now);
        let durable = match self.durable.purge_expired(now).await {
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "Durable cache purge failed");
                0
            }
        };
        debug!(%memory, %durable, "CacheManager::purge_expired: done");
        memory + durable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::durable::mock::FailingBackend;
    use crate::cache::entry::fixtures::content;
    use tempfile::TempDir;

    fn config() -> CacheConfig {
        CacheConfig {
            durable_dir: None,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache = CacheManager::in_memory();
        assert!(cache.get("gen_1").await.is_none());

        cache.set("gen_1", &content("a"), None).await;
        assert_eq!(cache.get("gen_1").await.unwrap(), content("a"));

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_requests, 2);
        assert!((stats.hit_rate - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_durable_hit_promoted_to_memory() {
        let backend = Arc::new(MemoryBackend::new());
        let writer = CacheManager::with_backend(&config(), backend.clone());
        writer.set("gen_1", &content("a"), None).await;

        // Fresh manager shares only the durable tier
        let reader = CacheManager::with_backend(&config(), backend.clone());
        assert_eq!(reader.stats().await.memory_entries, 0);
        assert_eq!(reader.get("gen_1").await.unwrap(), content("a"));
        assert_eq!(reader.stats().await.memory_entries, 1);

        // Served from memory even if the durable copy disappears
        backend.remove("gen_1").await.unwrap();
        assert!(reader.get("gen_1").await.is_some());
    }

    #[tokio::test]
    async fn test_durable_failures_are_misses() {
        let cache = CacheManager::with_backend(&config(), Arc::new(FailingBackend));
        assert!(cache.get("gen_1").await.is_none());

        cache.set("gen_1", &content("a"), None).await;
        assert!(cache.get("gen_1").await.is_some());

        let stats = cache.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert!(stats.durable_entries.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache() {
        let config = CacheConfig {
            enabled: false,
            durable_dir: None,
            ..Default::default()
        };
        let cache = CacheManager::new(&config);
        cache.set("gen_1", &content("a"), None).await;
        assert!(cache.get("gen_1").await.is_none());
        assert_eq!(cache.stats().await.total_requests, 0);
    }

    #[tokio::test]
    async fn test_clear() {
        let temp = TempDir::new().unwrap();
        let config = CacheConfig {
            durable_dir: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let cache = CacheManager::new(&config);
        cache.set("gen_1", &content("a"), None).await;
        cache.set("gen_2", &content("b"), None).await;
        assert_eq!(cache.stats().await.durable_entries, Some(2));

        cache.clear().await;
        let stats = cache.stats().await;
        assert_eq!(stats.memory_entries, 0);
        assert_eq!(stats.durable_entries, Some(0));
        assert!(cache.get("gen_1").await.is_none());
    }
}
