//! Ingestion outcomes and cached document envelope.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, ErrorClass};
use crate::limits::clamp_quality;
use crate::records::Record;

/// A cleaned record plus the ingestion metadata attached after cleaning.
/// This is the unit stored in the cache and handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestedDocument {
    pub record: Record,
    pub quality_score: f64,
    pub ingested_at: DateTime<Utc>,
    /// Stage flags: basic validation and enhanced cleaning both ran.
    pub validated: bool,
    pub cleaned: bool,
}

impl IngestedDocument {
    pub fn new(record: Record, quality_score: f64) -> Self {
        Self {
            record,
            quality_score: clamp_quality(quality_score),
            ingested_at: Utc::now(),
            validated: true,
            cleaned: true,
        }
    }
}

/// Outcome of one ingestion call. Value object, never mutated after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<IngestedDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    pub quality_score: f64,
    pub cache_hit: bool,
    pub elapsed_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl IngestionResult {
    pub fn success(payload: IngestedDocument, cache_hit: bool, elapsed: Duration) -> Self {
        Self {
            success: true,
            quality_score: payload.quality_score,
            payload: Some(payload),
            error: None,
            error_class: None,
            cache_hit,
            elapsed_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(err: &Error, elapsed: Duration) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(err.to_string()),
            error_class: Some(err.class()),
            quality_score: 0.0,
            cache_hit: false,
            elapsed_ms: elapsed.as_millis() as u64,
            timestamp: Utc::now(),
        }
    }
}
