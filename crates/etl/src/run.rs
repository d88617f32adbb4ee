//! Job run records and bounded history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agro_core::limits::{RUN_HISTORY_MAX_AGE_DAYS, RUN_HISTORY_MAX_ENTRIES};
use agro_core::IngestionResult;

use crate::job::EtlJobConfig;

/// Lifecycle of one job run: Pending → Running → terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }
}

/// One attempt-sequence of one job. Append-only once terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlJobRun {
    pub job_id: String,
    pub run_id: Uuid,
    pub status: RunStatus,
    pub started: DateTime<Utc>,
    pub ended: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
    /// Index of the last attempt made (0 = first try).
    pub attempt: u32,
    /// Quality and cache-hit flag from the underlying ingestion call.
    pub quality_score: Option<f64>,
    pub cache_hit: Option<bool>,
}

impl EtlJobRun {
    pub fn started_now(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            run_id: Uuid::new_v4(),
            status: RunStatus::Running,
            started: Utc::now(),
            ended: None,
            duration_ms: None,
            error: None,
            attempt: 0,
            quality_score: None,
            cache_hit: None,
        }
    }

    pub fn finish(&mut self, status: RunStatus) {
        let ended = Utc::now();
        self.status = status;
        self.ended = Some(ended);
        self.duration_ms = Some((ended - self.started).num_milliseconds().max(0) as u64);
    }

    pub fn finish_success(&mut self, result: &IngestionResult) {
        self.quality_score = Some(result.quality_score);
        self.cache_hit = Some(result.cache_hit);
        self.finish(RunStatus::Success);
    }

    pub fn finish_failed(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.finish(RunStatus::Failed);
    }

    pub fn skipped(job_id: impl Into<String>, reason: impl Into<String>) -> Self {
        let mut run = Self::started_now(job_id);
        run.error = Some(reason.into());
        run.finish(RunStatus::Skipped);
        run
    }
}

/// Append a run and trim the window (most recent entries first trimmed
/// by count, then by age).
pub fn push_trimmed(history: &mut Vec<EtlJobRun>, run: EtlJobRun) {
    history.push(run);
    if history.len() > RUN_HISTORY_MAX_ENTRIES {
        let excess = history.len() - RUN_HISTORY_MAX_ENTRIES;
        history.drain(..excess);
    }
    let cutoff = Utc::now() - chrono::Duration::days(RUN_HISTORY_MAX_AGE_DAYS);
    history.retain(|r| r.started >= cutoff);
}

/// Status summary returned by the orchestrator for one job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    pub config: EtlJobConfig,
    pub last_run: Option<EtlJobRun>,
    pub total_runs: u64,
    pub avg_duration_ms: f64,
    pub running: bool,
}
