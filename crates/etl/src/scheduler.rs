//! The ETL scheduler.
//!
//! Per job run: Pending → Running → {Success, Failed, Skipped,
//! Cancelled}. All entry points (scheduled tick, manual run, dependent
//! trigger) funnel through [`EtlScheduler::execute`], which re-checks
//! the running-set guard and dependency freshness immediately before
//! starting. The guard is an atomic check-and-set under one mutex, so
//! concurrent triggers of the same job collapse to one run.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{interval, sleep, timeout};
use tracing::{debug, error, info, warn};

use agro_core::limits::DEPENDENCY_LOOKBACK_HOURS;
use agro_core::{Error, ErrorClass, Result};
use agro_pipeline::IngestionPipeline;
use agro_telemetry::metrics;

use crate::job::EtlJobConfig;
use crate::run::{push_trimmed, EtlJobRun, JobStatus, RunStatus};

/// Scheduler tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How often due triggers are evaluated.
    #[serde(default = "default_tick_secs")]
    pub tick_interval_secs: u64,
    /// Dependencies must have succeeded within this window.
    #[serde(default = "default_lookback_hours")]
    pub dependency_lookback_hours: i64,
}

fn default_tick_secs() -> u64 {
    30
}

fn default_lookback_hours() -> i64 {
    DEPENDENCY_LOOKBACK_HOURS
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_secs(),
            dependency_lookback_hours: default_lookback_hours(),
        }
    }
}

struct JobEntry {
    config: EtlJobConfig,
    last_triggered: Option<DateTime<Utc>>,
    avg_duration_ms: f64,
    total_runs: u64,
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<String, JobEntry>,
    history: HashMap<String, Vec<EtlJobRun>>,
}

/// Schedules ingestion-pipeline calls on cron/interval triggers.
pub struct EtlScheduler {
    config: SchedulerConfig,
    pipeline: Arc<IngestionPipeline>,
    inner: Mutex<Inner>,
    /// Jobs with a run in flight. Guarded insert gives
    /// at-most-one-concurrent-run-per-job.
    running: Mutex<HashSet<String>>,
    /// Spawned run tasks. Drained after the tick loop exits so shutdown
    /// does not return before every in-flight run records its outcome.
    runs: Mutex<JoinSet<EtlJobRun>>,
    shutdown: watch::Receiver<bool>,
}

impl EtlScheduler {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        config: SchedulerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            config,
            pipeline,
            inner: Mutex::new(Inner::default()),
            running: Mutex::new(HashSet::new()),
            runs: Mutex::new(JoinSet::new()),
            shutdown,
        }
    }

    /// Register a job. The trigger, id uniqueness, and dependency ids
    /// are all validated here, before anything is scheduled.
    pub fn register_job(&self, config: EtlJobConfig) -> Result<()> {
        config.trigger.validate()?;

        let mut inner = self.inner.lock();
        if inner.jobs.contains_key(&config.id) {
            return Err(Error::configuration(format!(
                "job '{}' is already registered",
                config.id
            )));
        }
        for dep in &config.depends_on {
            if !inner.jobs.contains_key(dep) {
                return Err(Error::configuration(format!(
                    "job '{}' depends on unknown job '{}'",
                    config.id, dep
                )));
            }
        }

        info!(job_id = %config.id, source = %config.request.source, "registered ETL job");
        inner.jobs.insert(
            config.id.clone(),
            JobEntry {
                config,
                last_triggered: None,
                avg_duration_ms: 0.0,
                total_runs: 0,
            },
        );
        Ok(())
    }

    /// Disable a job: removed from trigger evaluation, in-flight runs
    /// complete normally.
    pub fn disable_job(&self, id: &str) -> Result<()> {
        self.set_enabled(id, false)
    }

    pub fn enable_job(&self, id: &str) -> Result<()> {
        self.set_enabled(id, true)
    }

    fn set_enabled(&self, id: &str, enabled: bool) -> Result<()> {
        let mut inner = self.inner.lock();
        let entry = inner
            .jobs
            .get_mut(id)
            .ok_or_else(|| Error::configuration(format!("unknown job '{}'", id)))?;
        entry.config.enabled = enabled;
        info!(job_id = %id, enabled, "job enabled flag changed");
        Ok(())
    }

    pub fn remove_job(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.lock();
        inner
            .jobs
            .remove(id)
            .ok_or_else(|| Error::configuration(format!("unknown job '{}'", id)))?;
        inner.history.remove(id);
        Ok(())
    }

    pub fn job_status(&self, id: &str) -> Option<JobStatus> {
        let inner = self.inner.lock();
        let entry = inner.jobs.get(id)?;
        Some(JobStatus {
            config: entry.config.clone(),
            last_run: inner
                .history
                .get(id)
                .and_then(|runs| runs.last().cloned()),
            total_runs: entry.total_runs,
            avg_duration_ms: entry.avg_duration_ms,
            running: self.running.lock().contains(id),
        })
    }

    pub fn history(&self, id: &str) -> Vec<EtlJobRun> {
        self.inner
            .lock()
            .history
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn job_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.lock().jobs.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Run a job immediately, bypassing its trigger. The concurrency
    /// guard and dependency check still apply.
    pub async fn run_job_now(self: Arc<Self>, id: &str) -> Result<EtlJobRun> {
        if !self.inner.lock().jobs.contains_key(id) {
            return Err(Error::configuration(format!("unknown job '{}'", id)));
        }
        let id = id.to_string();
        Ok(self.execute(id).await)
    }

    /// Start the trigger-evaluation loop. When the shutdown channel
    /// flips, queued runs never start and the task awaits every
    /// in-flight run before exiting, so each records its outcome.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let mut shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(self.config.tick_interval_secs));
            info!(
                tick_secs = self.config.tick_interval_secs,
                "ETL scheduler started"
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for id in self.due_jobs(Utc::now()) {
                            self.runs.lock().spawn(self.clone().execute(id));
                        }
                    }
                    _ = shutdown.wait_for(|stop| *stop) => {
                        info!("ETL scheduler stopping");
                        break;
                    }
                }
            }
            self.drain_runs().await;
        })
    }

    /// Enabled jobs whose trigger is due, highest priority first. Marks
    /// them triggered so a slow run is not re-triggered every tick.
    fn due_jobs(&self, now: DateTime<Utc>) -> Vec<String> {
        let mut inner = self.inner.lock();
        let mut due: Vec<(u8, String)> = Vec::new();
        for (id, entry) in inner.jobs.iter_mut() {
            if !entry.config.enabled {
                continue;
            }
            if entry.config.trigger.is_due(now, entry.last_triggered) {
                entry.last_triggered = Some(now);
                due.push((entry.config.priority, id.clone()));
            }
        }
        due.sort_by(|a, b| b.0.cmp(&a.0));
        due.into_iter().map(|(_, id)| id).collect()
    }

    /// Run one job through its full attempt sequence. All entry points
    /// converge here so the guard and dependency check always run
    /// directly before the first attempt. Returns a boxed future
    /// because successful runs spawn dependent executions of this same
    /// function.
    fn execute(self: Arc<Self>, id: String) -> Pin<Box<dyn Future<Output = EtlJobRun> + Send>> {
        Box::pin(async move {
            // Atomic check-and-set: insert fails if a run is in flight.
            if !self.running.lock().insert(id.clone()) {
                debug!(job_id = %id, "job already running, skipping");
                return EtlJobRun::skipped(&id, "already running");
            }
            metrics().jobs_running.set(self.running.lock().len() as u64);

            let run = self.execute_guarded(&id).await;

            self.running.lock().remove(&id);
            metrics().jobs_running.set(self.running.lock().len() as u64);

            if run.status == RunStatus::Success {
                for dependent in self.dependents_of(&id) {
                    debug!(job_id = %id, dependent = %dependent, "triggering dependent job");
                    self.runs.lock().spawn(self.clone().execute(dependent));
                }
            }
            run
        })
    }

    /// Await every spawned run to completion. Runs finishing during the
    /// drain may spawn dependents, so take-and-join until the set stays
    /// empty.
    async fn drain_runs(&self) {
        loop {
            let mut batch = std::mem::take(&mut *self.runs.lock());
            if batch.is_empty() {
                return;
            }
            while let Some(joined) = batch.join_next().await {
                if let Err(e) = joined {
                    if e.is_panic() {
                        warn!(error = %e, "job run panicked");
                    }
                }
            }
        }
    }

    async fn execute_guarded(&self, id: &str) -> EtlJobRun {
        let config = {
            let inner = self.inner.lock();
            match inner.jobs.get(id) {
                Some(entry) if entry.config.enabled => entry.config.clone(),
                Some(_) => {
                    debug!(job_id = %id, "job disabled, not running");
                    return EtlJobRun::skipped(id, "disabled");
                }
                None => return EtlJobRun::skipped(id, "unknown job"),
            }
        };

        if let Some(unmet) = self.unmet_dependency(&config) {
            let run = EtlJobRun::skipped(
                id,
                format!(
                    "dependency '{}' has no success within {}h",
                    unmet, self.config.dependency_lookback_hours
                ),
            );
            warn!(job_id = %id, dependency = %unmet, "skipping job, dependency not fresh");
            metrics().jobs_skipped.inc();
            self.record_run(run.clone());
            return run;
        }

        metrics().jobs_started.inc();
        metrics().jobs_running.set(self.running.lock().len() as u64);

        let mut run = EtlJobRun::started_now(id);
        let mut shutdown = self.shutdown.clone();
        let mut last_error = String::from("no attempts made");

        let attempts = config.retries + 1;
        for attempt in 0..attempts {
            run.attempt = attempt;

            let attempt_result = tokio::select! {
                res = timeout(
                    config.timeout(),
                    self.pipeline.ingest(
                        &config.request.source,
                        &config.request.operation,
                        &config.request.params,
                    ),
                ) => Some(res),
                _ = shutdown.wait_for(|stop| *stop) => None,
            };

            match attempt_result {
                None => {
                    info!(job_id = %id, attempt, "run cancelled by shutdown");
                    run.finish(RunStatus::Cancelled);
                    self.record_run(run.clone());
                    return run;
                }
                Some(Ok(result)) if result.success => {
                    run.finish_success(&result);
                    metrics().jobs_succeeded.inc();
                    self.record_run(run.clone());
                    return run;
                }
                Some(Ok(result)) => {
                    last_error = result
                        .error
                        .clone()
                        .unwrap_or_else(|| "ingestion failed".to_string());
                    // Configuration and validation failures are not
                    // transient; retrying them wastes adapter quota.
                    let retryable = matches!(
                        result.error_class,
                        Some(ErrorClass::Adapter) | Some(ErrorClass::JobTimeout) | None
                    );
                    if !retryable {
                        warn!(job_id = %id, error = %last_error, "non-retryable failure");
                        break;
                    }
                }
                Some(Err(_)) => {
                    last_error = Error::JobTimeout {
                        job_id: id.to_string(),
                        timeout_secs: config.timeout_secs,
                    }
                    .to_string();
                }
            }

            if attempt + 1 < attempts {
                debug!(
                    job_id = %id,
                    attempt,
                    delay_secs = config.retry_delay_secs,
                    error = %last_error,
                    "attempt failed, retrying after delay"
                );
                tokio::select! {
                    _ = sleep(config.retry_delay()) => {}
                    _ = shutdown.wait_for(|stop| *stop) => {
                        run.finish(RunStatus::Cancelled);
                        self.record_run(run.clone());
                        return run;
                    }
                }
            }
        }

        error!(job_id = %id, error = %last_error, attempts, "job failed after all attempts");
        metrics().jobs_failed.inc();
        run.finish_failed(last_error);
        self.record_run(run.clone());
        run
    }

    /// First declared dependency without a Success inside the lookback
    /// window, if any.
    fn unmet_dependency(&self, config: &EtlJobConfig) -> Option<String> {
        if config.depends_on.is_empty() {
            return None;
        }
        let cutoff = Utc::now() - chrono::Duration::hours(self.config.dependency_lookback_hours);
        let inner = self.inner.lock();
        config
            .depends_on
            .iter()
            .find(|dep| {
                let fresh = inner.history.get(*dep).is_some_and(|runs| {
                    runs.iter()
                        .any(|r| r.status == RunStatus::Success && r.started >= cutoff)
                });
                !fresh
            })
            .cloned()
    }

    /// Enabled jobs that declare `id` as a prerequisite. Each dependent
    /// re-runs the guard and its own dependency check inside `execute`.
    fn dependents_of(&self, id: &str) -> Vec<String> {
        let inner = self.inner.lock();
        inner
            .jobs
            .values()
            .filter(|e| e.config.enabled && e.config.depends_on.iter().any(|d| d == id))
            .map(|e| e.config.id.clone())
            .collect()
    }

    fn record_run(&self, run: EtlJobRun) {
        let mut inner = self.inner.lock();
        if run.status == RunStatus::Success {
            if let Some(entry) = inner.jobs.get_mut(&run.job_id) {
                entry.total_runs += 1;
                let duration = run.duration_ms.unwrap_or(0) as f64;
                let n = entry.total_runs as f64;
                entry.avg_duration_ms += (duration - entry.avg_duration_ms) / n;
            }
        }
        push_trimmed(inner.history.entry(run.job_id.clone()).or_default(), run);
    }
}
