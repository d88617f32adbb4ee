//! The ingestion service facade.
//!
//! Owns the source registry, tiered cache, ingestion pipeline, and ETL
//! scheduler, and ties their background tasks to one shutdown channel.
//! `start` spawns the tasks; `stop` flips the channel and awaits them.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use agro_cache::{
    spawn_sweep, standard_policies, CacheStatsSnapshot, RedisStore, RemoteStore, TieredCache,
};
use agro_core::category::Season;
use agro_core::{IngestionResult, Result, SourceConfig};
use agro_etl::{EtlJobConfig, EtlJobRun, EtlScheduler, JobStatus};
use agro_pipeline::{
    cache_key, IngestRequest, IngestionPipeline, Params, SourceAdapter, SourceRegistry,
};
use agro_telemetry::{health, metrics, HealthReport, MetricsSnapshot};

use crate::config::ServiceConfig;

/// Facade over the whole ingestion engine.
pub struct IngestionService {
    config: ServiceConfig,
    registry: Arc<SourceRegistry>,
    cache: Arc<TieredCache>,
    pipeline: Arc<IngestionPipeline>,
    scheduler: Arc<EtlScheduler>,
    shutdown: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl IngestionService {
    /// Build the service against the configured Redis L2 store.
    pub async fn connect(config: ServiceConfig) -> Result<Self> {
        let remote = Arc::new(RedisStore::connect(&config.cache.redis_url).await?);
        Ok(Self::with_remote(config, remote))
    }

    /// Build the service with an explicit remote store. This is the
    /// injection point for non-Redis backends and for tests.
    pub fn with_remote(config: ServiceConfig, remote: Arc<dyn RemoteStore>) -> Self {
        let (shutdown, _) = watch::channel(false);
        let cache = Arc::new(TieredCache::new(config.cache.clone(), remote));
        let registry = Arc::new(SourceRegistry::new());
        let pipeline = Arc::new(IngestionPipeline::new(registry.clone(), cache.clone()));
        let scheduler = Arc::new(EtlScheduler::new(
            pipeline.clone(),
            config.scheduler.clone(),
            shutdown.subscribe(),
        ));

        Self {
            config,
            registry,
            cache,
            pipeline,
            scheduler,
            shutdown,
            tasks: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// Spawn the background tasks: invalidation sweep, scheduler tick
    /// loop, and the periodic cache-warming pass over the configured
    /// requests. Idempotent while running.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            warn!("service already started");
            return;
        }
        let _ = self.shutdown.send(false);

        let mut tasks = self.tasks.lock();

        let policies = standard_policies(self.cache.config(), self.cache.season());
        tasks.push(spawn_sweep(
            self.cache.clone(),
            policies,
            self.shutdown.subscribe(),
        ));

        tasks.push(self.scheduler.clone().start());

        if !self.config.warm_requests.is_empty() {
            tasks.push(self.spawn_warming());
        }

        info!("ingestion service started");
    }

    /// Periodic warming: re-ingest warm-list entries whose cache keys
    /// have gone absent. The first pass runs immediately at startup.
    fn spawn_warming(&self) -> JoinHandle<()> {
        let pipeline = self.pipeline.clone();
        let cache = self.cache.clone();
        let requests = self.config.warm_requests.clone();
        let warm_interval = Duration::from_secs(self.config.warm_interval_secs);
        let mut shutdown = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(warm_interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let missing: Vec<IngestRequest> = requests
                            .iter()
                            .filter(|r| {
                                let key = cache_key(
                                    &cache.config().namespace,
                                    &r.source,
                                    &r.operation,
                                    &r.params,
                                );
                                !cache.contains_l1(&key)
                            })
                            .cloned()
                            .collect();
                        if missing.is_empty() {
                            continue;
                        }
                        let total = missing.len();
                        let results = pipeline.batch_ingest(missing).await;
                        let failed = results.iter().filter(|r| !r.success).count();
                        info!(total, failed, "cache warm pass complete");
                    }
                    _ = shutdown.changed() => {
                        if *shutdown.borrow() {
                            info!("cache warming stopping");
                            return;
                        }
                    }
                }
            }
        })
    }

    /// Signal shutdown and await every background task. In-flight job
    /// runs finish as Cancelled; queued runs never start.
    pub async fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }
        let _ = self.shutdown.send(true);

        let handles: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    warn!(error = %e, "background task panicked during shutdown");
                }
            }
        }
        info!("ingestion service stopped");
    }

    pub fn register_source(
        &self,
        config: SourceConfig,
        adapter: Arc<dyn SourceAdapter>,
    ) -> Result<()> {
        self.registry.register(config, adapter)
    }

    pub async fn ingest(&self, source: &str, operation: &str, params: &Params) -> IngestionResult {
        self.pipeline.ingest(source, operation, params).await
    }

    pub async fn batch_ingest(&self, requests: Vec<IngestRequest>) -> Vec<IngestionResult> {
        self.pipeline.batch_ingest(requests).await
    }

    /// Drop cached entries for one source, or the whole namespace when
    /// `source` is `None`. Returns the number of tier entries removed.
    pub async fn refresh_cache(&self, source: Option<&str>) -> u64 {
        let namespace = &self.cache.config().namespace;
        let pattern = match source {
            Some(name) => format!("{}:{}:*", namespace, name),
            None => format!("{}:*", namespace),
        };
        let removed = self.cache.clear_by_pattern(&pattern).await;
        info!(pattern = %pattern, removed, "cache refresh");
        removed
    }

    /// Set the season tag read by the seasonal invalidation policy.
    pub fn set_season(&self, season: Season) {
        info!(%season, "season changed");
        self.cache.season().set(season);
    }

    pub fn register_job(&self, config: EtlJobConfig) -> Result<()> {
        self.scheduler.register_job(config)
    }

    pub async fn run_job_now(&self, id: &str) -> Result<EtlJobRun> {
        self.scheduler.clone().run_job_now(id).await
    }

    pub fn enable_job(&self, id: &str) -> Result<()> {
        self.scheduler.enable_job(id)
    }

    pub fn disable_job(&self, id: &str) -> Result<()> {
        self.scheduler.disable_job(id)
    }

    pub fn remove_job(&self, id: &str) -> Result<()> {
        self.scheduler.remove_job(id)
    }

    pub fn job_status(&self, id: &str) -> Option<JobStatus> {
        self.scheduler.job_status(id)
    }

    pub fn job_history(&self, id: &str) -> Vec<EtlJobRun> {
        self.scheduler.history(id)
    }

    /// Probe the components and return the aggregated report. Remote
    /// cache loss degrades the report; repeatedly failing sources make
    /// it unhealthy.
    pub async fn health_check(&self) -> HealthReport {
        if self.cache.backend_healthy().await {
            health().cache_backend.set_healthy();
        } else {
            health()
                .cache_backend
                .set_unhealthy("remote store unreachable");
        }

        let threshold = self.config.degraded_failure_threshold;
        let failing: Vec<String> = self
            .registry
            .names()
            .into_iter()
            .filter(|name| self.pipeline.consecutive_failures(name) >= threshold)
            .collect();
        if failing.is_empty() {
            health().pipeline.set_healthy();
        } else {
            health()
                .pipeline
                .set_unhealthy(format!("sources failing repeatedly: {}", failing.join(", ")));
        }

        health().report()
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        metrics().snapshot()
    }

    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Arc<IngestionPipeline> {
        &self.pipeline
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn scheduler(&self) -> &Arc<EtlScheduler> {
        &self.scheduler
    }
}
