//! Service configuration, layered from an optional `agro.toml` file and
//! `AGRO__`-prefixed environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use agro_cache::CacheConfig;
use agro_core::{Error, Result};
use agro_etl::SchedulerConfig;
use agro_pipeline::IngestRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// A source with this many consecutive ingest failures marks the
    /// pipeline component unhealthy.
    #[serde(default = "default_degraded_threshold")]
    pub degraded_failure_threshold: u64,
    /// Requests kept warm in the cache by the background warming task.
    #[serde(default)]
    pub warm_requests: Vec<IngestRequest>,
    /// How often the warm list is re-checked for absent entries.
    #[serde(default = "default_warm_interval_secs")]
    pub warm_interval_secs: u64,
}

fn default_degraded_threshold() -> u64 {
    5
}

fn default_warm_interval_secs() -> u64 {
    300
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            scheduler: SchedulerConfig::default(),
            degraded_failure_threshold: default_degraded_threshold(),
            warm_requests: Vec::new(),
            warm_interval_secs: default_warm_interval_secs(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration: `agro.toml` if present, then environment
    /// overrides (`AGRO__CACHE__REDIS_URL` and so on). A `.env` file is
    /// read first if one exists.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .add_source(File::with_name("agro").required(false))
            .add_source(Environment::with_prefix("AGRO").separator("__"))
            .build()
            .map_err(|e| Error::configuration(format!("failed to load configuration: {}", e)))?;

        settings
            .try_deserialize()
            .map_err(|e| Error::configuration(format!("invalid configuration: {}", e)))
    }
}
