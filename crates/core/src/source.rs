//! Source configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::category::DataCategory;

/// Configuration for one logical data source. Immutable after
/// registration; the registry owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source name, also the second segment of cache keys.
    pub name: String,
    pub category: DataCategory,
    /// Provider-side courtesy limit; enforced by the adapter.
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_min: u32,
    /// Per-fetch timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries for scheduled (ETL) calls; the pipeline itself never retries.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Cache TTL override in seconds; falls back to the category default.
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    /// Minimum acceptable quality score in [0,1].
    #[serde(default = "default_min_quality")]
    pub min_quality_score: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_rate_limit() -> u32 {
    60
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    3
}

fn default_min_quality() -> f64 {
    0.5
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, category: DataCategory) -> Self {
        Self {
            name: name.into(),
            category,
            rate_limit_per_min: default_rate_limit(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            cache_ttl_secs: None,
            min_quality_score: default_min_quality(),
            enabled: true,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Effective cache TTL: explicit override or the category default.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.category.default_ttl())
    }
}
