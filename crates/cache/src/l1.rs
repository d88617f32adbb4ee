//! In-process bounded LRU store.
//!
//! The index, per-category byte accounting, and LRU order are all mutated
//! under one mutex per cache instance; callers never touch entries
//! directly.

use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agro_core::{DataCategory, IngestedDocument};

use crate::config::CacheConfig;
use crate::entry::{CacheEntry, EntryView};

#[derive(Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    bytes_by_category: HashMap<DataCategory, usize>,
    next_seq: u64,
}

/// Outcome of an insert, for stats accounting.
#[derive(Debug, Default, Clone, Copy)]
pub struct InsertOutcome {
    pub stored: bool,
    pub evictions: u64,
}

/// Bounded in-process cache with per-category byte caps and
/// least-recently-used eviction.
pub struct L1Cache {
    inner: Mutex<Inner>,
    caps: HashMap<DataCategory, usize>,
}

impl L1Cache {
    pub fn new(config: &CacheConfig) -> Self {
        let caps = DataCategory::ALL
            .into_iter()
            .map(|c| (c, config.l1_capacity_for(c)))
            .collect();
        Self {
            inner: Mutex::new(Inner::default()),
            caps,
        }
    }

    /// Look up a key. Expired entries are dropped and reported as misses.
    /// Returns the payload and whether an expired entry was purged.
    pub fn get(&self, key: &str) -> (Option<Arc<IngestedDocument>>, bool) {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) if entry.is_expired(now) => true,
            Some(_) => false,
            None => return (None, false),
        };

        if expired {
            Self::remove_locked(&mut inner, key);
            return (None, true);
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let entry = inner
            .entries
            .get_mut(key)
            .unwrap_or_else(|| unreachable!("checked above"));
        entry.last_access = now;
        entry.access_count += 1;
        entry.seq = seq;
        (Some(entry.value.clone()), false)
    }

    /// Insert a value, evicting least-recently-accessed entries of the
    /// same category until it fits. A value larger than the whole
    /// category cap is not stored.
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: Arc<IngestedDocument>,
        size: usize,
        ttl: Duration,
        category: DataCategory,
    ) -> InsertOutcome {
        let key = key.into();
        let cap = self.caps.get(&category).copied().unwrap_or(usize::MAX);
        if size > cap {
            tracing::debug!(key = %key, size, cap, "payload exceeds L1 category cap, skipping L1");
            return InsertOutcome::default();
        }

        let now = Instant::now();
        let mut inner = self.inner.lock();

        // Replacing an existing entry frees its bytes first.
        Self::remove_locked(&mut inner, &key);

        let mut evictions = 0u64;
        while inner.bytes_by_category.get(&category).copied().unwrap_or(0) + size > cap {
            let victim = inner
                .entries
                .values()
                .filter(|e| e.category == category)
                .min_by_key(|e| e.seq)
                .map(|e| e.key.clone());
            match victim {
                Some(victim_key) => {
                    tracing::trace!(key = %victim_key, "evicting least-recently-used entry");
                    Self::remove_locked(&mut inner, &victim_key);
                    evictions += 1;
                }
                None => break,
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        *inner.bytes_by_category.entry(category).or_default() += size;
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                key,
                value,
                created: now,
                last_access: now,
                access_count: 0,
                seq,
                size,
                ttl,
                category,
                compressed: false,
            },
        );

        InsertOutcome {
            stored: true,
            evictions,
        }
    }

    pub fn remove(&self, key: &str) -> bool {
        Self::remove_locked(&mut self.inner.lock(), key)
    }

    /// Remove every entry whose key matches the compiled pattern.
    pub fn remove_matching(&self, pattern: &Regex) -> u64 {
        let mut inner = self.inner.lock();
        let victims: Vec<String> = inner
            .entries
            .keys()
            .filter(|k| pattern.is_match(k))
            .cloned()
            .collect();
        for key in &victims {
            Self::remove_locked(&mut inner, key);
        }
        victims.len() as u64
    }

    /// Remove every entry for which the predicate holds. Used by the
    /// invalidation sweep.
    pub fn invalidate_where(&self, pred: impl Fn(&EntryView) -> bool) -> u64 {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        let victims: Vec<String> = inner
            .entries
            .values()
            .filter(|e| pred(&e.view(now)))
            .map(|e| e.key.clone())
            .collect();
        for key in &victims {
            Self::remove_locked(&mut inner, key);
        }
        victims.len() as u64
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Per-category (entry count, bytes) for stats snapshots.
    pub fn category_usage(&self) -> HashMap<DataCategory, (usize, usize)> {
        let inner = self.inner.lock();
        let mut usage: HashMap<DataCategory, (usize, usize)> = HashMap::new();
        for entry in inner.entries.values() {
            let slot = usage.entry(entry.category).or_default();
            slot.0 += 1;
            slot.1 += entry.size;
        }
        usage
    }

    fn remove_locked(inner: &mut Inner, key: &str) -> bool {
        if let Some(entry) = inner.entries.remove(key) {
            if let Some(bytes) = inner.bytes_by_category.get_mut(&entry.category) {
                *bytes = bytes.saturating_sub(entry.size);
            }
            true
        } else {
            false
        }
    }
}
