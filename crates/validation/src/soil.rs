//! Soil record cleaner.

use agro_core::{CleaningResult, DataCategory, Record, ValidationIssue};

use crate::cleaner::{category_mismatch, finish, Cleaner};
use crate::rules::{promote_numeric_extra, NumericRule};

/// Cleans soil survey measurements. pH is bounded by chemistry; nutrient
/// levels far above agronomic norms are flagged for review rather than
/// altered.
#[derive(Debug, Clone, Copy)]
pub struct SoilCleaner;

impl SoilCleaner {
    fn rules() -> [NumericRule; 6] {
        [
            NumericRule::new("ph", 0.0..=14.0).with_typical(3.5..=9.0),
            NumericRule::new("organic_matter_pct", 0.0..=100.0).with_typical(0.5..=12.0),
            NumericRule::new("moisture_pct", 0.0..=110.0)
                .with_correction(0.0..=100.0)
                .with_typical(5.0..=60.0),
            NumericRule::new("nitrogen_ppm", 0.0..=1000.0).with_typical(0.0..=200.0),
            NumericRule::new("phosphorus_ppm", 0.0..=1000.0).with_typical(0.0..=150.0),
            NumericRule::new("potassium_ppm", 0.0..=2000.0).with_typical(0.0..=600.0),
        ]
    }
}

impl Cleaner for SoilCleaner {
    fn category(&self) -> DataCategory {
        DataCategory::Soil
    }

    fn clean(&self, record: Record) -> CleaningResult {
        let mut s = match record {
            Record::Soil(s) => s,
            other => return category_mismatch(other, DataCategory::Soil),
        };
        let mut issues: Vec<ValidationIssue> = Vec::new();

        for (slot, field) in [
            (&mut s.ph, "ph"),
            (&mut s.organic_matter_pct, "organic_matter_pct"),
            (&mut s.moisture_pct, "moisture_pct"),
            (&mut s.nitrogen_ppm, "nitrogen_ppm"),
            (&mut s.phosphorus_ppm, "phosphorus_ppm"),
            (&mut s.potassium_ppm, "potassium_ppm"),
        ] {
            if slot.is_none() {
                let (value, issue) = promote_numeric_extra(&mut s.extras, field);
                *slot = value;
                issues.extend(issue);
            }
        }

        let [ph, om, moisture, n, p, k] = Self::rules();
        for (slot, rule) in [
            (&mut s.ph, ph),
            (&mut s.organic_matter_pct, om),
            (&mut s.moisture_pct, moisture),
            (&mut s.nitrogen_ppm, n),
            (&mut s.phosphorus_ppm, p),
            (&mut s.potassium_ppm, k),
        ] {
            let outcome = rule.apply(*slot);
            *slot = outcome.value;
            issues.extend(outcome.issues);
        }

        finish(Record::Soil(s), issues)
    }
}
