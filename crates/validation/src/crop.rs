//! Crop record cleaner.

use agro_core::{CleaningResult, DataCategory, Record, ValidationIssue};

use crate::cleaner::{category_mismatch, finish, Cleaner};
use crate::rules::{promote_numeric_extra, NumericRule};

/// Cleans crop condition observations.
#[derive(Debug, Clone, Copy)]
pub struct CropCleaner;

impl CropCleaner {
    fn rules() -> [NumericRule; 3] {
        [
            // 400 bu/ac is beyond any recorded corn yield.
            NumericRule::new("yield_bu_ac", 0.0..=400.0).with_typical(20.0..=250.0),
            NumericRule::new("grain_moisture_pct", 0.0..=60.0).with_typical(8.0..=35.0),
            // BBCH scale runs 0-99.
            NumericRule::new("growth_stage", 0.0..=99.0),
        ]
    }
}

impl Cleaner for CropCleaner {
    fn category(&self) -> DataCategory {
        DataCategory::Crop
    }

    fn clean(&self, record: Record) -> CleaningResult {
        let mut c = match record {
            Record::Crop(c) => c,
            other => return category_mismatch(other, DataCategory::Crop),
        };
        let mut issues: Vec<ValidationIssue> = Vec::new();

        for (slot, field) in [
            (&mut c.yield_bu_ac, "yield_bu_ac"),
            (&mut c.grain_moisture_pct, "grain_moisture_pct"),
            (&mut c.growth_stage, "growth_stage"),
        ] {
            if slot.is_none() {
                let (value, issue) = promote_numeric_extra(&mut c.extras, field);
                *slot = value;
                issues.extend(issue);
            }
        }

        let [yield_rule, moisture, stage] = Self::rules();
        for (slot, rule) in [
            (&mut c.yield_bu_ac, yield_rule),
            (&mut c.grain_moisture_pct, moisture),
            (&mut c.growth_stage, stage),
        ] {
            let outcome = rule.apply(*slot);
            *slot = outcome.value;
            issues.extend(outcome.issues);
        }

        finish(Record::Crop(c), issues)
    }
}
