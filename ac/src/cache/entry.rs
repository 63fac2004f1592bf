//! Cache entries

use serde::{Deserialize, Serialize};

use crate::domain::GeneratedContent;

/// A cached generation result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub data: GeneratedContent,
    /// Creation time (unix ms)
    pub timestamp: i64,
    /// Time to live (ms)
    pub ttl_ms: u64,
    pub access_count: u64,
    /// Last read (unix ms)
    pub last_accessed: i64,
}

impl CacheEntry {
    pub fn new(key: impl Into<String>, data: GeneratedContent, ttl_ms: u64, now: i64) -> Self {
        Self {
            key: key.into(),
            data,
            timestamp: now,
            ttl_ms,
            access_count: 0,
            last_accessed: now,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.timestamp) > self.ttl_ms as i64
    }

    /// Record a read
    pub fn touch(&mut self, now: i64) {
        self.access_count += 1;
        self.last_accessed = now;
    }
}

/// Current time in unix milliseconds
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::{AdCopy, ContentMetadata, GeneratedContent};

    pub fn content(tag: &str) -> GeneratedContent {
        GeneratedContent::new(
            AdCopy {
                titles: vec![format!("{} title", tag)],
                descriptions: vec![format!("{} description", tag)],
            },
            ContentMetadata {
                model: "gpt-4o-mini".to_string(),
                industry: Some("e-commerce".to_string()),
                timestamp: 0,
                validation_score: 1.0,
                processing_time_ms: 10,
                retry_count: 0,
            },
        )
    }
}
