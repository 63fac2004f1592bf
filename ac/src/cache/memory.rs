//! In-process cache tier

use std::collections::HashMap;
use std::time::Duration;

use tracing::debug;

use super::entry::CacheEntry;
use crate::domain::GeneratedContent;

/// Fraction of entries evicted when the tier is full
const EVICTION_FRACTION: f64 = 0.2;

/// Fast tier with TTL expiry and least-recently-used eviction
#[derive(Debug)]
pub struct MemoryTier {
    entries: HashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl MemoryTier {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        debug!(?ttl, %max_entries, "MemoryTier::new: called");
        Self {
            entries: HashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Read an entry, dropping it when expired
    pub fn get(&mut self, key: &str, now: i64) -> Option<GeneratedContent> {
        match self.entries.get_mut(key) {
            None => {
                debug!(%key, "MemoryTier::get: miss");
                return None;
            }
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now);
                debug!(%key, access_count = entry.access_count, "MemoryTier::get: hit");
                return Some(entry.data.clone());
            }
            Some(_) => {}
        }
        debug!(%key, "MemoryTier::get: expired");
        self.entries.remove(key);
        None
    }

    /// Insert an entry, evicting first when full
    pub fn set(&mut self, key: &str, data: GeneratedContent, ttl: Option<Duration>, now: i64) {
        let ttl = ttl.unwrap_or(self.ttl);
        debug!(%key, ?ttl, size = self.entries.len(), "MemoryTier::set: called");

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.purge_expired(now);
            if self.entries.len() >= self.max_entries {
                self.evict_least_recently_used();
            }
        }

        let entry = CacheEntry::new(key, data, ttl.as_millis() as u64, now);
        self.entries.insert(key.to_string(), entry);
    }

    /// Drop the oldest 20% of entries by last access
    fn evict_least_recently_used(&mut self) {
        let count = ((self.entries.len() as f64 * EVICTION_FRACTION).ceil() as usize).max(1);
        let mut by_access: Vec<(i64, String)> = self
            .entries
            .values()
            .map(|e| (e.last_accessed, e.key.clone()))
            .collect();
        by_access.sort();
        debug!(%count, "MemoryTier::evict_least_recently_used: evicting");
        for (_, key) in by_access.into_iter().take(count) {
            self.entries.remove(&key);
        }
    }

    /// Remove all expired entries, returning how many were dropped
    pub fn purge_expired(&mut self, now: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
