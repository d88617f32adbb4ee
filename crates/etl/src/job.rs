//! ETL job configuration and triggers.

use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

use agro_core::{Error, Result};
use agro_pipeline::IngestRequest;

use crate::cron_util::{is_cron_due, normalize_cron};

/// When a job fires: a cron expression or a fixed interval in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobTrigger {
    Cron(String),
    IntervalMinutes(u64),
}

impl JobTrigger {
    /// Validate the trigger at registration time.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Cron(expr) => {
                let normalized = normalize_cron(expr);
                Schedule::from_str(&normalized).map_err(|e| {
                    Error::invalid_trigger(format!("bad cron expression '{}': {}", expr, e))
                })?;
                Ok(())
            }
            Self::IntervalMinutes(0) => {
                Err(Error::invalid_trigger("interval must be at least 1 minute"))
            }
            Self::IntervalMinutes(_) => Ok(()),
        }
    }

    /// Whether the trigger is due at `now` given the last trigger time.
    /// Call only after `validate` has passed.
    pub fn is_due(&self, now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> bool {
        match self {
            Self::Cron(expr) => match Schedule::from_str(&normalize_cron(expr)) {
                Ok(schedule) => is_cron_due(&schedule, now, last),
                Err(_) => false,
            },
            Self::IntervalMinutes(minutes) => match last {
                Some(last) => now - last >= chrono::Duration::minutes(*minutes as i64),
                None => true,
            },
        }
    }
}

/// Configuration for one scheduled ingestion job. Mutable only via
/// enable/disable after registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlJobConfig {
    /// Unique job id.
    pub id: String,
    /// The ingestion request this job refreshes.
    pub request: IngestRequest,
    pub trigger: JobTrigger,
    /// Higher-priority due jobs start first within a tick.
    #[serde(default)]
    pub priority: u8,
    /// Hard wall-clock bound per attempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Retries after the first failed attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Prerequisite job ids; each must have succeeded within the
    /// lookback window for this job to run.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay_secs() -> u64 {
    10
}

fn default_enabled() -> bool {
    true
}

impl EtlJobConfig {
    pub fn new(id: impl Into<String>, request: IngestRequest, trigger: JobTrigger) -> Self {
        Self {
            id: id.into(),
            request,
            trigger,
            priority: 0,
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            enabled: true,
            depends_on: Vec::new(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cron_trigger_validates() {
        assert!(JobTrigger::Cron("*/10 * * * *".into()).validate().is_ok());
        assert!(JobTrigger::Cron("not cron".into()).validate().is_err());
        assert!(JobTrigger::IntervalMinutes(0).validate().is_err());
        assert!(JobTrigger::IntervalMinutes(15).validate().is_ok());
    }

    #[test]
    fn interval_trigger_due_after_elapse() {
        let trigger = JobTrigger::IntervalMinutes(30);
        let now = Utc::now();
        assert!(trigger.is_due(now, None));
        assert!(!trigger.is_due(now, Some(now - chrono::Duration::minutes(10))));
        assert!(trigger.is_due(now, Some(now - chrono::Duration::minutes(31))));
    }
}
