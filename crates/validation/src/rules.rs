//! Field-level rules shared by the per-category cleaners.

use serde_json::{json, Value};
use std::ops::RangeInclusive;

use agro_core::{IssueAction, Severity, ValidationIssue};

/// Outcome of running one rule over one field.
#[derive(Debug)]
pub struct RuleOutcome {
    /// Value to keep in the cleaned record; `None` when removed.
    pub value: Option<f64>,
    pub issues: Vec<ValidationIssue>,
}

/// Range rule for one numeric field.
///
/// Checks run in order: plausibility (violation removes the value),
/// correction (clamp back into the valid range), typicality (flag only).
#[derive(Debug, Clone)]
pub struct NumericRule {
    pub field: &'static str,
    /// Physically plausible bounds; outside → Critical, value removed.
    pub plausible: RangeInclusive<f64>,
    /// Valid domain bounds; plausible values outside them are clamped
    /// back with a Warning when set, otherwise only flagged.
    pub valid: Option<RangeInclusive<f64>>,
    /// Typical bounds; values outside are flagged, never changed.
    pub typical: Option<RangeInclusive<f64>>,
}

impl NumericRule {
    pub const fn new(field: &'static str, plausible: RangeInclusive<f64>) -> Self {
        Self {
            field,
            plausible,
            valid: None,
            typical: None,
        }
    }

    pub fn with_correction(mut self, valid: RangeInclusive<f64>) -> Self {
        self.valid = Some(valid);
        self
    }

    pub fn with_typical(mut self, typical: RangeInclusive<f64>) -> Self {
        self.typical = Some(typical);
        self
    }

    /// Apply the rule. `None` input passes through untouched.
    pub fn apply(&self, value: Option<f64>) -> RuleOutcome {
        let Some(v) = value else {
            return RuleOutcome {
                value: None,
                issues: Vec::new(),
            };
        };

        let mut issues = Vec::new();

        if !v.is_finite() || !self.plausible.contains(&v) {
            issues.push(ValidationIssue::new(
                self.field,
                Severity::Critical,
                format!(
                    "{} outside physically plausible range [{}, {}]",
                    v,
                    self.plausible.start(),
                    self.plausible.end()
                ),
                json!(v),
                None,
                IssueAction::Remove,
            ));
            return RuleOutcome {
                value: None,
                issues,
            };
        }

        let mut v = v;
        if let Some(valid) = &self.valid {
            if !valid.contains(&v) {
                let corrected = v.clamp(*valid.start(), *valid.end());
                issues.push(ValidationIssue::new(
                    self.field,
                    Severity::Warning,
                    format!("{} outside valid range, corrected to {}", v, corrected),
                    json!(v),
                    Some(json!(corrected)),
                    IssueAction::Correct,
                ));
                v = corrected;
            }
        }

        if let Some(typical) = &self.typical {
            if !typical.contains(&v) {
                issues.push(ValidationIssue::new(
                    self.field,
                    Severity::Warning,
                    format!(
                        "{} outside typical range [{}, {}]",
                        v,
                        typical.start(),
                        typical.end()
                    ),
                    json!(v),
                    None,
                    IssueAction::Flag,
                ));
            }
        }

        RuleOutcome {
            value: Some(v),
            issues,
        }
    }
}

/// Pull a numeric value for `field` out of a provider `extras` map,
/// coercing strings like `"72.5"`. Used to fill typed fields the adapter
/// left empty. Returns the value plus a Normalize issue on string
/// coercion, or an Error/Remove issue for an uncoercible entry.
pub fn promote_numeric_extra(
    extras: &mut Value,
    field: &str,
) -> (Option<f64>, Option<ValidationIssue>) {
    let Some(map) = extras.as_object_mut() else {
        return (None, None);
    };
    let Some(raw) = map.remove(field) else {
        return (None, None);
    };

    match &raw {
        Value::Number(n) => (n.as_f64(), None),
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(v) => {
                let issue = ValidationIssue::new(
                    field,
                    Severity::Info,
                    format!("coerced string \"{}\" to numeric", s),
                    raw.clone(),
                    Some(json!(v)),
                    IssueAction::Normalize,
                );
                (Some(v), Some(issue))
            }
            Err(_) => {
                let issue = ValidationIssue::new(
                    field,
                    Severity::Error,
                    format!("non-numeric value \"{}\"", s),
                    raw.clone(),
                    None,
                    IssueAction::Remove,
                );
                (None, Some(issue))
            }
        },
        _ => {
            let issue = ValidationIssue::new(
                field,
                Severity::Error,
                "value is neither numeric nor a numeric string",
                raw.clone(),
                None,
                IssueAction::Remove,
            );
            (None, Some(issue))
        }
    }
}
