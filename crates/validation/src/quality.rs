//! Quality and confidence scoring.

use agro_core::limits::clamp_quality;
use agro_core::{IssueAction, Severity, ValidationIssue};

/// Penalty for one issue. Removing data costs more than a finding that
/// left usable data behind.
fn penalty(issue: &ValidationIssue) -> f64 {
    match (issue.severity, issue.action) {
        (Severity::Critical, IssueAction::Remove) => 0.4,
        (Severity::Critical, _) => 0.3,
        (Severity::Error, IssueAction::Remove) => 0.25,
        (Severity::Error, _) => 0.2,
        (Severity::Warning, _) => 0.1,
        (Severity::Info, _) => 0.0,
    }
}

/// Aggregate quality score in [0,1]: start at 1.0, subtract per-issue
/// penalties, then adjust for completeness of the expected field set.
pub fn quality_score(issues: &[ValidationIssue], present: usize, expected: usize) -> f64 {
    let mut score = 1.0 - issues.iter().map(penalty).sum::<f64>();

    if expected > 0 {
        if present >= expected {
            score += 0.05;
        } else {
            let missing_fraction = (expected - present) as f64 / expected as f64;
            score -= 0.05 * missing_fraction;
        }
    }

    clamp_quality(score)
}

/// Issue-weighted average of per-action confidence. 1.0 when nothing was
/// found.
pub fn cleaning_confidence(issues: &[ValidationIssue]) -> f64 {
    if issues.is_empty() {
        return 1.0;
    }
    issues.iter().map(|i| i.confidence).sum::<f64>() / issues.len() as f64
}
