//! Source adapter registry.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use agro_core::{Error, Result, SourceConfig};
use agro_telemetry::metrics;

use crate::adapter::SourceAdapter;

/// Maps a logical source name to its configuration and adapter. Configs
/// are immutable after registration.
#[derive(Default)]
pub struct SourceRegistry {
    sources: RwLock<HashMap<String, (Arc<SourceConfig>, Arc<dyn SourceAdapter>)>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source. A name maps to exactly one adapter; duplicates
    /// are rejected.
    pub fn register(&self, config: SourceConfig, adapter: Arc<dyn SourceAdapter>) -> Result<()> {
        let mut sources = self.sources.write();
        if sources.contains_key(&config.name) {
            return Err(Error::configuration(format!(
                "source '{}' is already registered",
                config.name
            )));
        }
        tracing::info!(source = %config.name, category = %config.category, "registered source");
        sources.insert(config.name.clone(), (Arc::new(config), adapter));
        metrics().registered_sources.set(sources.len() as u64);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<(Arc<SourceConfig>, Arc<dyn SourceAdapter>)> {
        self.sources.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.read().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sources.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sources.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
