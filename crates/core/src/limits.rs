//! Shared limits and physical bounds.

/// Payloads above this size are gzip-compressed before remote storage.
pub const COMPRESSION_THRESHOLD_BYTES: usize = 8 * 1024;

/// Run history kept per job (whichever of count/age trims first).
pub const RUN_HISTORY_MAX_ENTRIES: usize = 50;
pub const RUN_HISTORY_MAX_AGE_DAYS: i64 = 7;

/// Dependency freshness lookback for ETL jobs.
pub const DEPENDENCY_LOOKBACK_HOURS: i64 = 24;

/// Physically plausible temperature range for ground weather stations (°F).
pub const TEMP_PLAUSIBLE_F: (f64, f64) = (-60.0, 140.0);

/// Sensor overshoot above 100% humidity that is still correctable.
pub const HUMIDITY_CORRECTABLE_MAX: f64 = 110.0;

/// Quality scores live in [0,1].
pub fn clamp_quality(score: f64) -> f64 {
    score.clamp(0.0, 1.0)
}
