//! ETL orchestrator: scheduled ingestion-pipeline calls with timeout,
//! bounded retries, and one-hop job dependencies.
//!
//! This is deliberately a flat job registry with declared one-hop
//! dependencies, not a general DAG executor.

pub mod cron_util;
pub mod job;
pub mod run;
pub mod scheduler;

pub use job::{EtlJobConfig, JobTrigger};
pub use run::{EtlJobRun, JobStatus, RunStatus};
pub use scheduler::{EtlScheduler, SchedulerConfig};
