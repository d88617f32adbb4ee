//! Test context wiring a full service against in-memory collaborators.

use std::sync::Arc;

use agro_core::{DataCategory, SourceConfig};
use agro_service::{IngestionService, ServiceConfig};

use crate::fixtures;
use crate::mocks::{MemoryRemoteStore, MockAdapter};

/// A complete service with mock adapters for a weather source ("noaa")
/// and a market source ("cme"), backed by an in-memory remote store.
pub struct TestContext {
    pub service: Arc<IngestionService>,
    pub remote: Arc<MemoryRemoteStore>,
    pub weather: Arc<MockAdapter>,
    pub market: Arc<MockAdapter>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let remote = MemoryRemoteStore::new();
        let service = Arc::new(IngestionService::with_remote(config, remote.clone()));

        let weather = MockAdapter::new(fixtures::weather_record());
        service
            .register_source(
                SourceConfig::new("noaa", DataCategory::Weather),
                weather.clone(),
            )
            .expect("register weather source");

        let market = MockAdapter::new(fixtures::market_record());
        service
            .register_source(
                SourceConfig::new("cme", DataCategory::Market),
                market.clone(),
            )
            .expect("register market source");

        Self {
            service,
            remote,
            weather,
            market,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
