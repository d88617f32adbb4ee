//! Unified error taxonomy for the ingestion engine.
//!
//! Expected failures travel as `Result<T, Error>`; each variant carries a
//! stable [`ErrorClass`] so callers (job status endpoints, ingestion
//! results) can classify failures without parsing messages.

use thiserror::Error;

use crate::issue::ValidationIssue;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Stable machine-readable classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Unknown or disabled source; never retried.
    Configuration,
    /// Adapter network/timeout/malformed-response failure; retried only by
    /// the ETL layer.
    Adapter,
    /// Blocking data-quality failure; never retried.
    Validation,
    /// Remote cache store unreachable; absorbed, never surfaced to callers.
    CacheBackend,
    /// Job exceeded its configured duration.
    JobTimeout,
    /// Malformed trigger at job registration time.
    InvalidTrigger,
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Adapter => "adapter",
            Self::Validation => "validation",
            Self::CacheBackend => "cache_backend",
            Self::JobTimeout => "job_timeout",
            Self::InvalidTrigger => "invalid_trigger",
            Self::Internal => "internal",
        }
    }
}

/// Unified error type for the ingestion engine.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("adapter error for source '{source_name}': {message}")]
    Adapter {
        source_name: String,
        message: String,
    },

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        issues: Vec<ValidationIssue>,
    },

    #[error("cache backend error: {0}")]
    CacheBackend(String),

    #[error("job '{job_id}' timed out after {timeout_secs}s")]
    JobTimeout { job_id: String, timeout_secs: u64 },

    #[error("invalid trigger: {0}")]
    InvalidTrigger(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn adapter(source: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Adapter {
            source_name: source.into(),
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>, issues: Vec<ValidationIssue>) -> Self {
        Self::Validation {
            message: msg.into(),
            issues,
        }
    }

    pub fn cache_backend(msg: impl Into<String>) -> Self {
        Self::CacheBackend(msg.into())
    }

    pub fn invalid_trigger(msg: impl Into<String>) -> Self {
        Self::InvalidTrigger(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable classification for this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Configuration(_) => ErrorClass::Configuration,
            Self::Adapter { .. } => ErrorClass::Adapter,
            Self::Validation { .. } => ErrorClass::Validation,
            Self::CacheBackend(_) => ErrorClass::CacheBackend,
            Self::JobTimeout { .. } => ErrorClass::JobTimeout,
            Self::InvalidTrigger(_) => ErrorClass::InvalidTrigger,
            Self::Serialization(_) | Self::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Whether the ETL layer may retry the operation that produced this.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Adapter { .. } | Self::JobTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classes_are_stable() {
        assert_eq!(
            Error::configuration("nope").class().as_str(),
            "configuration"
        );
        assert_eq!(Error::adapter("noaa", "down").class().as_str(), "adapter");
        assert!(Error::adapter("noaa", "down").is_retryable());
        assert!(!Error::validation("bad", vec![]).is_retryable());
    }

    #[test]
    fn adapter_errors_name_the_source() {
        let err = Error::adapter("noaa", "connection refused");
        assert_eq!(
            err.to_string(),
            "adapter error for source 'noaa': connection refused"
        );
    }
}
