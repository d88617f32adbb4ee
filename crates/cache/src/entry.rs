//! Cache entry bookkeeping.

use std::sync::Arc;
use std::time::{Duration, Instant};

use agro_core::{DataCategory, IngestedDocument};

/// One L1 cache entry. Owned exclusively by its cache tier and mutated
/// only under that tier's mutex.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: Arc<IngestedDocument>,
    pub created: Instant,
    pub last_access: Instant,
    pub access_count: u64,
    /// Monotonic access sequence used for LRU ordering.
    pub seq: u64,
    /// Serialized payload size in bytes, used for capacity accounting.
    pub size: usize,
    pub ttl: Duration,
    pub category: DataCategory,
    pub compressed: bool,
}

impl CacheEntry {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.age(now) > self.ttl
    }

    /// Read-only view handed to invalidation policies.
    pub fn view(&self, now: Instant) -> EntryView {
        EntryView {
            age: self.age(now),
            ttl: self.ttl,
            category: self.category,
        }
    }
}

/// What invalidation policies get to see about an entry.
#[derive(Debug, Clone, Copy)]
pub struct EntryView {
    pub age: Duration,
    pub ttl: Duration,
    pub category: DataCategory,
}
