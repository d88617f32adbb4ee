//! The ingest orchestration.
//!
//! Within one call the stages run strictly in order: cache lookup,
//! adapter fetch, basic validation, enhanced cleaning, cache write.
//! Concurrent calls for the same key are not coalesced; the first
//! completed write populates the cache for everyone after it.

use chrono::Utc;
use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, warn};
use validator::Validate;

use agro_cache::TieredCache;
use agro_core::{
    Error, IngestedDocument, IngestionResult, IssueAction, Record, Result, Severity,
    SourceConfig, ValidationIssue,
};
use agro_telemetry::metrics;
use agro_validate::{CategoryCleaner, Cleaner};

use crate::key::cache_key;
use crate::registry::SourceRegistry;

/// Request parameters, sorted by construction.
pub type Params = BTreeMap<String, serde_json::Value>;

/// One ingestion request, as used by `batch_ingest` and the ETL jobs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct IngestRequest {
    pub source: String,
    pub operation: String,
    #[serde(default)]
    pub params: Params,
}

#[derive(Debug, Default, Clone, Copy)]
struct FailureStats {
    total: u64,
    consecutive: u64,
}

/// Orchestrates fetch → validate → clean → cache for registered sources.
pub struct IngestionPipeline {
    registry: Arc<SourceRegistry>,
    cache: Arc<TieredCache>,
    failures: Mutex<HashMap<String, FailureStats>>,
}

impl IngestionPipeline {
    pub fn new(registry: Arc<SourceRegistry>, cache: Arc<TieredCache>) -> Self {
        Self {
            registry,
            cache,
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<TieredCache> {
        &self.cache
    }

    /// Ingest one (source, operation, params) request.
    ///
    /// Never returns `Err`: every failure mode is folded into a failed
    /// [`IngestionResult`] with a stable error class.
    pub async fn ingest(&self, source: &str, operation: &str, params: &Params) -> IngestionResult {
        let started = Instant::now();
        metrics().ingest_requests.inc();

        let result = self.ingest_inner(source, operation, params, started).await;
        match result {
            Ok(result) => {
                metrics().ingest_success.inc();
                self.record_success(source);
                result
            }
            Err(err) => {
                metrics().ingest_failures.inc();
                match err.class() {
                    agro_core::ErrorClass::Adapter => {
                        metrics().adapter_errors.inc();
                        self.record_failure(source);
                    }
                    agro_core::ErrorClass::Validation => {
                        metrics().validation_failures.inc();
                        self.record_failure(source);
                    }
                    _ => {}
                }
                warn!(source, operation, error = %err, "ingestion failed");
                IngestionResult::failure(&err, started.elapsed())
            }
        }
    }

    async fn ingest_inner(
        &self,
        source: &str,
        operation: &str,
        params: &Params,
        started: Instant,
    ) -> Result<IngestionResult> {
        // 1. Source must exist and be enabled; no side effects otherwise.
        let (config, adapter) = self
            .registry
            .get(source)
            .ok_or_else(|| Error::configuration(format!("unknown source '{}'", source)))?;
        if !config.enabled {
            return Err(Error::configuration(format!(
                "source '{}' is disabled",
                source
            )));
        }

        // 2-3. Stable key, then cache lookup.
        let key = cache_key(
            &self.cache.config().namespace,
            source,
            operation,
            params,
        );
        if let Some(doc) = self.cache.get(&key, config.category).await {
            metrics().cache_hits.inc();
            debug!(source, key = %key, "cache hit");
            let elapsed = started.elapsed();
            metrics().ingest_latency_ms.observe(elapsed.as_millis() as u64);
            return Ok(IngestionResult::success(doc, true, elapsed));
        }
        metrics().cache_misses.inc();

        // 4. Adapter fetch under the source's timeout. Retrying scheduled
        // fetches is the ETL orchestrator's job, not this layer's.
        let record = match timeout(config.timeout(), adapter.fetch(operation, params)).await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                return Err(Error::adapter(source, e.to_string()));
            }
            Err(_) => {
                return Err(Error::adapter(
                    source,
                    format!("fetch timed out after {}s", config.timeout_secs),
                ));
            }
        };

        // 5. Basic structural validation; failures are not cached.
        let basic_score = basic_validate(&record, &config)?;

        // 6. Enhanced cleaning; merged quality is the worse of the two
        // stages.
        let (doc, quality) = match CategoryCleaner::for_category(config.category) {
            Some(cleaner) => {
                let cleaning = cleaner.clean(record);
                let quality = cleaning.quality_score.min(basic_score);
                if cleaning.has_blocking_issues() || quality < config.min_quality_score {
                    return Err(Error::validation(
                        format!(
                            "quality {:.2} below threshold {:.2} for source '{}'",
                            quality, config.min_quality_score, source
                        ),
                        cleaning.issues,
                    ));
                }
                for action in &cleaning.actions {
                    debug!(source, action = %action, "cleaning action");
                }
                (IngestedDocument::new(cleaning.cleaned, quality), quality)
            }
            // Pass-through category (recommendations): basic stage only.
            None => {
                let mut doc = IngestedDocument::new(record, basic_score);
                doc.cleaned = false;
                (doc, basic_score)
            }
        };

        // 7. Cache write with the source's TTL, then success.
        self.cache
            .set_with_ttl(&key, &doc, config.category, config.cache_ttl())
            .await;

        let elapsed = started.elapsed();
        metrics().ingest_latency_ms.observe(elapsed.as_millis() as u64);
        debug!(source, key = %key, quality, "ingested and cached");
        Ok(IngestionResult::success(doc, false, elapsed))
    }

    /// Fan out independent ingest calls concurrently; a failing call
    /// becomes a failed result, never an aborted batch.
    pub async fn batch_ingest(&self, requests: Vec<IngestRequest>) -> Vec<IngestionResult> {
        join_all(
            requests
                .iter()
                .map(|r| self.ingest(&r.source, &r.operation, &r.params)),
        )
        .await
    }

    /// Total failures per source since startup.
    pub fn failure_counts(&self) -> HashMap<String, u64> {
        self.failures
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.total))
            .collect()
    }

    /// Consecutive failures for one source; resets on success.
    pub fn consecutive_failures(&self, source: &str) -> u64 {
        self.failures
            .lock()
            .get(source)
            .map(|s| s.consecutive)
            .unwrap_or(0)
    }

    fn record_failure(&self, source: &str) {
        let mut failures = self.failures.lock();
        let stats = failures.entry(source.to_string()).or_default();
        stats.total += 1;
        stats.consecutive += 1;
    }

    fn record_success(&self, source: &str) {
        if let Some(stats) = self.failures.lock().get_mut(source) {
            stats.consecutive = 0;
        }
    }
}

/// Stage one: structural sanity before the domain cleaner runs.
/// Returns the basic-stage quality score.
fn basic_validate(record: &Record, config: &SourceConfig) -> Result<f64> {
    if record.category() != config.category {
        let issue = ValidationIssue::new(
            "category",
            Severity::Critical,
            format!(
                "adapter for '{}' returned a {} record, expected {}",
                config.name,
                record.category(),
                config.category
            ),
            serde_json::json!(record.category().as_str()),
            None,
            IssueAction::Remove,
        );
        return Err(Error::validation("record category mismatch", vec![issue]));
    }

    if record.is_empty() {
        return Err(Error::validation(
            format!("adapter for '{}' returned an empty record", config.name),
            vec![],
        ));
    }

    let structural = match record {
        Record::Weather(w) => w.validate(),
        Record::Soil(s) => s.validate(),
        Record::Crop(c) => c.validate(),
        Record::Market(m) => m.validate(),
        Record::Recommendation { .. } => Ok(()),
    };
    if let Err(errors) = structural {
        let issues = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    ValidationIssue::new(
                        field.to_string(),
                        Severity::Error,
                        e.to_string(),
                        serde_json::Value::Null,
                        None,
                        IssueAction::Remove,
                    )
                })
            })
            .collect();
        return Err(Error::validation("structural validation failed", issues));
    }

    // A timestamp from the future means a clock problem upstream; dock
    // the basic score but let the record through.
    let observed = match record {
        Record::Weather(w) => w.observed_at,
        Record::Soil(s) => s.sampled_at,
        Record::Crop(c) => c.observed_at,
        Record::Market(m) => m.quoted_at,
        Record::Recommendation { .. } => None,
    };
    let score = match observed {
        Some(ts) if ts > Utc::now() + chrono::Duration::hours(1) => 0.8,
        Some(_) => 1.0,
        None => 0.95,
    };
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::{DataCategory, WeatherRecord};

    #[test]
    fn basic_validation_rejects_category_mismatch() {
        let config = SourceConfig::new("noaa", DataCategory::Soil);
        let record = Record::Weather(WeatherRecord {
            temperature_f: Some(70.0),
            ..Default::default()
        });
        let err = basic_validate(&record, &config).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }

    #[test]
    fn basic_validation_rejects_empty_record() {
        let config = SourceConfig::new("noaa", DataCategory::Weather);
        let record = Record::Weather(WeatherRecord::default());
        assert!(basic_validate(&record, &config).is_err());
    }

    #[test]
    fn future_timestamp_docks_basic_score() {
        let config = SourceConfig::new("noaa", DataCategory::Weather);
        let record = Record::Weather(WeatherRecord {
            temperature_f: Some(70.0),
            observed_at: Some(Utc::now() + chrono::Duration::days(2)),
            ..Default::default()
        });
        assert_eq!(basic_validate(&record, &config).unwrap(), 0.8);
    }
}
