//! Weather record cleaner.

use agro_core::limits::{HUMIDITY_CORRECTABLE_MAX, TEMP_PLAUSIBLE_F};
use agro_core::{CleaningResult, DataCategory, Record, ValidationIssue};

use crate::cleaner::{category_mismatch, finish, Cleaner};
use crate::rules::{promote_numeric_extra, NumericRule};

/// Cleans weather observations.
///
/// Temperature outside ground-station bounds is removed; humidity sensor
/// overshoot up to 110% is clamped back to 100%; hurricane-force wind and
/// extreme precipitation are kept but flagged.
#[derive(Debug, Clone, Copy)]
pub struct WeatherCleaner;

impl WeatherCleaner {
    fn rules() -> [NumericRule; 5] {
        [
            NumericRule::new("temperature_f", TEMP_PLAUSIBLE_F.0..=TEMP_PLAUSIBLE_F.1)
                .with_typical(-30.0..=115.0),
            NumericRule::new("humidity_pct", 0.0..=HUMIDITY_CORRECTABLE_MAX)
                .with_correction(0.0..=100.0),
            NumericRule::new("wind_mph", 0.0..=200.0).with_typical(0.0..=75.0),
            NumericRule::new("precipitation_in", 0.0..=50.0).with_typical(0.0..=10.0),
            NumericRule::new("pressure_inhg", 25.0..=32.5).with_typical(28.5..=31.0),
        ]
    }
}

impl Cleaner for WeatherCleaner {
    fn category(&self) -> DataCategory {
        DataCategory::Weather
    }

    fn clean(&self, record: Record) -> CleaningResult {
        let mut w = match record {
            Record::Weather(w) => w,
            other => return category_mismatch(other, DataCategory::Weather),
        };
        let mut issues: Vec<ValidationIssue> = Vec::new();

        // Providers that report through generic key-value feeds land in
        // extras; promote anything we have a typed slot for.
        for (slot, field) in [
            (&mut w.temperature_f, "temperature_f"),
            (&mut w.humidity_pct, "humidity_pct"),
            (&mut w.wind_mph, "wind_mph"),
            (&mut w.precipitation_in, "precipitation_in"),
            (&mut w.pressure_inhg, "pressure_inhg"),
        ] {
            if slot.is_none() {
                let (value, issue) = promote_numeric_extra(&mut w.extras, field);
                *slot = value;
                issues.extend(issue);
            }
        }

        let [temp, humidity, wind, precip, pressure] = Self::rules();
        for (slot, rule) in [
            (&mut w.temperature_f, temp),
            (&mut w.humidity_pct, humidity),
            (&mut w.wind_mph, wind),
            (&mut w.precipitation_in, precip),
            (&mut w.pressure_inhg, pressure),
        ] {
            let outcome = rule.apply(*slot);
            *slot = outcome.value;
            issues.extend(outcome.issues);
        }

        finish(Record::Weather(w), issues)
    }
}
