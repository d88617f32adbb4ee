//! Background invalidation sweep.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use crate::policy::InvalidationPolicy;
use crate::tiered::TieredCache;

/// Spawn the periodic invalidation sweep. The task exits when the
/// shutdown channel flips to `true`.
pub fn spawn_sweep(
    cache: Arc<TieredCache>,
    policies: Vec<Arc<dyn InvalidationPolicy>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let sweep_interval = cache.config().sweep_interval();
    tokio::spawn(async move {
        let mut ticker = interval(sweep_interval);
        // The first tick completes immediately; skip it so a fresh cache
        // is not swept at startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let invalidated = cache.sweep_once(&policies);
                    debug!(invalidated, "cache sweep tick");
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("cache sweep stopping");
                        return;
                    }
                }
            }
        }
    })
}
