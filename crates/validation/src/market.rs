//! Market record cleaner.

use agro_core::{CleaningResult, DataCategory, IssueAction, Record, Severity, ValidationIssue};
use serde_json::json;

use crate::cleaner::{category_mismatch, finish, Cleaner};
use crate::rules::{promote_numeric_extra, NumericRule};

/// Cleans market quotes. A non-positive price is meaningless for a spot
/// quote and is removed outright.
#[derive(Debug, Clone, Copy)]
pub struct MarketCleaner;

impl MarketCleaner {
    fn rules() -> [NumericRule; 2] {
        [
            NumericRule::new("volume", 0.0..=f64::MAX),
            // Limit moves beyond ±50% in a day are reporting errors.
            NumericRule::new("change_pct", -50.0..=50.0).with_typical(-15.0..=15.0),
        ]
    }
}

impl Cleaner for MarketCleaner {
    fn category(&self) -> DataCategory {
        DataCategory::Market
    }

    fn clean(&self, record: Record) -> CleaningResult {
        let mut m = match record {
            Record::Market(m) => m,
            other => return category_mismatch(other, DataCategory::Market),
        };
        let mut issues: Vec<ValidationIssue> = Vec::new();

        for (slot, field) in [
            (&mut m.price_usd, "price_usd"),
            (&mut m.volume, "volume"),
            (&mut m.change_pct, "change_pct"),
        ] {
            if slot.is_none() {
                let (value, issue) = promote_numeric_extra(&mut m.extras, field);
                *slot = value;
                issues.extend(issue);
            }
        }

        // Price gets a bespoke check: zero and negative are both invalid,
        // which an inclusive range rule cannot express.
        if let Some(price) = m.price_usd {
            if !price.is_finite() || price <= 0.0 {
                issues.push(ValidationIssue::new(
                    "price_usd",
                    Severity::Critical,
                    format!("non-positive price {}", price),
                    json!(price),
                    None,
                    IssueAction::Remove,
                ));
                m.price_usd = None;
            }
        }

        let [volume, change] = Self::rules();
        for (slot, rule) in [(&mut m.volume, volume), (&mut m.change_pct, change)] {
            let outcome = rule.apply(*slot);
            *slot = outcome.value;
            issues.extend(outcome.issues);
        }

        finish(Record::Market(m), issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agro_core::MarketRecord;

    #[test]
    fn negative_price_is_removed() {
        let result = MarketCleaner.clean(Record::Market(MarketRecord {
            commodity: Some("corn".into()),
            price_usd: Some(-1.2),
            ..Default::default()
        }));
        assert!(result.has_blocking_issues());
        let Record::Market(cleaned) = &result.cleaned else {
            panic!("expected market record");
        };
        assert!(cleaned.price_usd.is_none());
    }

    #[test]
    fn large_move_is_flagged() {
        let result = MarketCleaner.clean(Record::Market(MarketRecord {
            commodity: Some("wheat".into()),
            price_usd: Some(6.10),
            change_pct: Some(22.0),
            ..Default::default()
        }));
        assert!(result.issues.iter().any(|i| i.action == IssueAction::Flag));
        assert!(!result.has_blocking_issues());
    }
}
