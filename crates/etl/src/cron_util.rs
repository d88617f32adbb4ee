//! Cron normalization and due-check helpers.

use chrono::{DateTime, Utc};
use cron::Schedule;

/// Normalize a 5-field cron expression to 6-field by prepending "0 " for
/// seconds.
///
/// The `cron` crate requires 6 fields: `sec min hour day-of-month month
/// day-of-week`. Job configs use standard 5-field cron.
pub fn normalize_cron(cron_5field: &str) -> String {
    let trimmed = cron_5field.trim();
    if trimmed.split_whitespace().count() == 5 {
        format!("0 {}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Check if a cron schedule is due at `now`.
///
/// A job is due if a scheduled tick falls between `last_run` (exclusive)
/// and `now` (inclusive). With no previous run, any tick in the trailing
/// day counts.
pub fn is_cron_due(
    schedule: &Schedule,
    now: DateTime<Utc>,
    last_run: Option<DateTime<Utc>>,
) -> bool {
    let check_from = last_run.unwrap_or(now - chrono::Duration::days(1));
    match schedule.after(&check_from).next() {
        Some(next) => next <= now,
        None => false,
    }
}
