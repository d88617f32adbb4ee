//! Validation issues and cleaning results.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::limits::clamp_quality;
use crate::records::Record;

/// How bad a data-quality finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// What the cleaner did about a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueAction {
    /// Value dropped from the cleaned record.
    Remove,
    /// Value replaced with a corrected one.
    Correct,
    /// Value coerced into canonical form (e.g. string → numeric).
    Normalize,
    /// Value kept but marked suspicious.
    Flag,
}

impl IssueAction {
    /// Confidence that the action preserved the data's meaning.
    pub fn confidence(&self) -> f64 {
        match self {
            Self::Normalize => 0.95,
            Self::Correct => 0.9,
            Self::Flag => 0.7,
            Self::Remove => 0.5,
        }
    }
}

/// One data-quality finding on one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub severity: Severity,
    pub message: String,
    pub original: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested: Option<Value>,
    pub action: IssueAction,
    pub confidence: f64,
}

impl ValidationIssue {
    pub fn new(
        field: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        original: Value,
        suggested: Option<Value>,
        action: IssueAction,
    ) -> Self {
        Self {
            field: field.into(),
            severity,
            message: message.into(),
            original,
            suggested,
            action,
            confidence: action.confidence(),
        }
    }

    /// Whether this issue blocks the record from being served.
    pub fn is_blocking(&self) -> bool {
        matches!(self.severity, Severity::Critical | Severity::Error)
            && self.action == IssueAction::Remove
    }
}

/// Output of one cleaning pass over a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningResult {
    pub cleaned: Record,
    pub issues: Vec<ValidationIssue>,
    /// Human-readable log of actions taken, for diagnostics.
    pub actions: Vec<String>,
    /// Aggregate data quality in [0,1].
    pub quality_score: f64,
    /// Issue-weighted confidence that cleaning preserved meaning.
    pub confidence: f64,
}

impl CleaningResult {
    /// Clean pass with no findings.
    pub fn clean(record: Record, quality_score: f64) -> Self {
        Self {
            cleaned: record,
            issues: Vec::new(),
            actions: Vec::new(),
            quality_score: clamp_quality(quality_score),
            confidence: 1.0,
        }
    }

    pub fn has_blocking_issues(&self) -> bool {
        self.issues.iter().any(ValidationIssue::is_blocking)
    }

    /// Valid iff nothing blocking happened and quality clears the source's
    /// configured floor.
    pub fn is_valid(&self, min_quality: f64) -> bool {
        !self.has_blocking_issues() && self.quality_score >= min_quality
    }
}
