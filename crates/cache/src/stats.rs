//! Per-cache operation counters and smoothed latency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use agro_core::DataCategory;
use agro_telemetry::{Counter, Ewma};

/// Live counters owned by a cache instance.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: Counter,
    pub misses: Counter,
    pub sets: Counter,
    pub deletes: Counter,
    pub evictions: Counter,
    pub expired: Counter,
    pub remote_failures: Counter,
    pub l1_hits: Counter,
    pub l2_hits: Counter,
    pub get_latency_ms: Ewma,
    pub set_latency_ms: Ewma,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(
        &self,
        usage: HashMap<DataCategory, (usize, usize)>,
    ) -> CacheStatsSnapshot {
        let hits = self.hits.get();
        let misses = self.misses.get();
        CacheStatsSnapshot {
            timestamp: Utc::now(),
            hits,
            misses,
            sets: self.sets.get(),
            deletes: self.deletes.get(),
            evictions: self.evictions.get(),
            expired: self.expired.get(),
            remote_failures: self.remote_failures.get(),
            l1_hits: self.l1_hits.get(),
            l2_hits: self.l2_hits.get(),
            hit_rate_pct: if hits + misses == 0 {
                0.0
            } else {
                hits as f64 / (hits + misses) as f64 * 100.0
            },
            get_latency_ms: self.get_latency_ms.get(),
            set_latency_ms: self.set_latency_ms.get(),
            categories: usage
                .into_iter()
                .map(|(cat, (entries, bytes))| {
                    (
                        cat,
                        CategoryUsage {
                            entries: entries as u64,
                            bytes: bytes as u64,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Point-in-time view of cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStatsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub expired: u64,
    pub remote_failures: u64,
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub hit_rate_pct: f64,
    pub get_latency_ms: f64,
    pub set_latency_ms: f64,
    pub categories: HashMap<DataCategory, CategoryUsage>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CategoryUsage {
    pub entries: u64,
    pub bytes: u64,
}
