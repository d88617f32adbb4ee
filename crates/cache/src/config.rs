//! Cache configuration.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use agro_core::category::Season;
use agro_core::limits::COMPRESSION_THRESHOLD_BYTES;
use agro_core::DataCategory;

/// Tiered cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Key namespace, first segment of every cache key.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Redis connection URL for the L2 store.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
    /// Upper bound on any single remote operation.
    #[serde(default = "default_remote_timeout_ms")]
    pub remote_timeout_ms: u64,
    /// Payloads above this many bytes are gzipped before remote storage.
    #[serde(default = "default_compression_threshold")]
    pub compression_threshold_bytes: usize,
    /// Background invalidation sweep interval.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Per-category TTL overrides in seconds; categories not listed use
    /// their built-in defaults.
    #[serde(default)]
    pub ttl_overrides_secs: HashMap<DataCategory, u64>,
    /// Per-category L1 byte-cap overrides.
    #[serde(default)]
    pub l1_capacity_overrides: HashMap<DataCategory, usize>,
    /// Seasonal TTL multipliers. Growing-season weather is refreshed more
    /// aggressively than winter weather.
    #[serde(default = "default_seasonal_multipliers")]
    pub seasonal_multipliers: HashMap<Season, f64>,
    /// Hard per-category max age in seconds, overriding TTL when shorter.
    #[serde(default)]
    pub freshness_max_age_secs: HashMap<DataCategory, u64>,
}

fn default_namespace() -> String {
    "agro".to_string()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_remote_timeout_ms() -> u64 {
    500
}

fn default_compression_threshold() -> usize {
    COMPRESSION_THRESHOLD_BYTES
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_seasonal_multipliers() -> HashMap<Season, f64> {
    HashMap::from([
        (Season::Spring, 0.75),
        (Season::Summer, 0.5),
        (Season::Fall, 0.75),
        (Season::Winter, 1.5),
    ])
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            redis_url: default_redis_url(),
            remote_timeout_ms: default_remote_timeout_ms(),
            compression_threshold_bytes: default_compression_threshold(),
            sweep_interval_secs: default_sweep_interval_secs(),
            ttl_overrides_secs: HashMap::new(),
            l1_capacity_overrides: HashMap::new(),
            seasonal_multipliers: default_seasonal_multipliers(),
            freshness_max_age_secs: HashMap::new(),
        }
    }
}

impl CacheConfig {
    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Effective TTL for a category.
    pub fn ttl_for(&self, category: DataCategory) -> Duration {
        self.ttl_overrides_secs
            .get(&category)
            .map(|s| Duration::from_secs(*s))
            .unwrap_or_else(|| category.default_ttl())
    }

    /// Effective L1 byte cap for a category.
    pub fn l1_capacity_for(&self, category: DataCategory) -> usize {
        self.l1_capacity_overrides
            .get(&category)
            .copied()
            .unwrap_or_else(|| category.default_l1_capacity_bytes())
    }
}
