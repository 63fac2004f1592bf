//! Generated content cache
//!
//! A memory tier in front of a durable tier, keyed by a short hash of the
//! request fields that shape the output.

mod durable;
mod entry;
mod key;
mod manager;
mod memory;

pub use durable::{DurableBackend, DurableError, DurableTier, FileBackend, MemoryBackend};
pub use entry::CacheEntry;
pub use key::{cache_key, fingerprint};
pub use manager::{CacheManager, CacheStats};
pub use memory::MemoryTier;
