//! Internal metrics collection.
//!
//! Counters are collected in-memory and exposed as point-in-time
//! snapshots through the service facade.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// A gauge metric (can go up or down).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec(&self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Exponentially smoothed moving average, stored as f64 bits in an atomic.
///
/// Used for cache and ingest latency where a full histogram is overkill
/// but a raw mean drifts too slowly.
#[derive(Debug)]
pub struct Ewma {
    bits: AtomicU64,
    alpha: f64,
}

impl Ewma {
    pub fn new(alpha: f64) -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
            alpha,
        }
    }

    pub fn observe(&self, value: f64) {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let avg = f64::from_bits(current);
            let next = if avg == 0.0 {
                value
            } else {
                self.alpha * value + (1.0 - self.alpha) * avg
            };
            match self.bits.compare_exchange_weak(
                current,
                next.to_bits(),
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

impl Default for Ewma {
    fn default() -> Self {
        Self::new(0.2)
    }
}

/// Histogram for latency tracking.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, 10s
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000, 10000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        for (i, &bound) in Self::BUCKET_BOUNDS.iter().enumerate() {
            if ms <= bound {
                self.buckets[i].fetch_add(1, Ordering::Relaxed);
                return;
            }
        }
        // Value exceeds all buckets, add to last
        self.buckets[10].fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }
}

/// Collected metrics for the ingestion engine.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingestion pipeline
    pub ingest_requests: Counter,
    pub ingest_success: Counter,
    pub ingest_failures: Counter,
    pub validation_failures: Counter,
    pub adapter_errors: Counter,

    // Cache
    pub cache_hits: Counter,
    pub cache_misses: Counter,

    // ETL jobs
    pub jobs_started: Counter,
    pub jobs_succeeded: Counter,
    pub jobs_failed: Counter,
    pub jobs_skipped: Counter,

    // Latency
    pub ingest_latency_ms: Histogram,

    // Gauges
    pub jobs_running: Gauge,
    pub registered_sources: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.ingest_requests.get();
        let success = self.ingest_success.get();
        let hits = self.cache_hits.get();
        let misses = self.cache_misses.get();

        MetricsSnapshot {
            timestamp: Utc::now(),
            ingest_requests: requests,
            ingest_success: success,
            ingest_failures: self.ingest_failures.get(),
            validation_failures: self.validation_failures.get(),
            adapter_errors: self.adapter_errors.get(),
            cache_hits: hits,
            cache_misses: misses,
            jobs_started: self.jobs_started.get(),
            jobs_succeeded: self.jobs_succeeded.get(),
            jobs_failed: self.jobs_failed.get(),
            jobs_skipped: self.jobs_skipped.get(),
            jobs_running: self.jobs_running.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            success_rate_pct: pct(success, requests),
            cache_hit_rate_pct: pct(hits, hits + misses),
        }
    }
}

fn pct(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub ingest_requests: u64,
    pub ingest_success: u64,
    pub ingest_failures: u64,
    pub validation_failures: u64,
    pub adapter_errors: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub jobs_started: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
    pub jobs_skipped: u64,
    pub jobs_running: u64,
    pub ingest_latency_mean_ms: f64,
    pub success_rate_pct: f64,
    pub cache_hit_rate_pct: f64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_rates() {
        let m = Metrics::new();
        m.ingest_requests.inc_by(4);
        m.ingest_success.inc_by(3);
        m.cache_hits.inc_by(1);
        m.cache_misses.inc_by(3);

        let snap = m.snapshot();
        assert_eq!(snap.success_rate_pct, 75.0);
        assert_eq!(snap.cache_hit_rate_pct, 25.0);
    }

    #[test]
    fn ewma_converges_toward_observations() {
        let e = Ewma::new(0.5);
        e.observe(100.0);
        assert_eq!(e.get(), 100.0);
        e.observe(0.0);
        assert_eq!(e.get(), 50.0);
        e.observe(0.0);
        assert_eq!(e.get(), 25.0);
    }
}
