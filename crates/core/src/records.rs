//! Typed per-category records exchanged between adapters, the cleaner, and
//! the cache.
//!
//! Adapters deserialize provider responses into these shapes at the
//! boundary; the rest of the pipeline never does stringly-typed field
//! lookups. Unknown provider fields land in `extras` and survive the trip
//! untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::category::DataCategory;

/// Weather observation for a point location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
pub struct WeatherRecord {
    /// Air temperature (°F)
    pub temperature_f: Option<f64>,
    /// Relative humidity (%)
    pub humidity_pct: Option<f64>,
    /// Sustained wind speed (mph)
    #[validate(range(min = 0.0))]
    pub wind_mph: Option<f64>,
    /// Precipitation over the observation window (inches)
    #[validate(range(min = 0.0))]
    pub precipitation_in: Option<f64>,
    /// Barometric pressure (inHg)
    pub pressure_inhg: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extras: Value,
}

/// Soil survey measurement for a sample site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
pub struct SoilRecord {
    pub ph: Option<f64>,
    /// Organic matter (%)
    #[validate(range(min = 0.0, max = 100.0))]
    pub organic_matter_pct: Option<f64>,
    /// Volumetric moisture (%)
    pub moisture_pct: Option<f64>,
    /// Nitrogen (ppm)
    pub nitrogen_ppm: Option<f64>,
    /// Phosphorus (ppm)
    pub phosphorus_ppm: Option<f64>,
    /// Potassium (ppm)
    pub potassium_ppm: Option<f64>,
    pub sampled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extras: Value,
}

/// Crop condition / yield observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
pub struct CropRecord {
    #[validate(length(max = 64))]
    pub crop: Option<String>,
    /// Expected yield (bushels/acre)
    #[validate(range(min = 0.0))]
    pub yield_bu_ac: Option<f64>,
    /// Grain moisture (%)
    pub grain_moisture_pct: Option<f64>,
    /// BBCH-style growth stage index
    pub growth_stage: Option<f64>,
    pub observed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extras: Value,
}

/// Market quote for a commodity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
pub struct MarketRecord {
    #[validate(length(max = 64))]
    pub commodity: Option<String>,
    /// Spot price (USD per bushel or cwt)
    pub price_usd: Option<f64>,
    /// Traded volume (contracts)
    pub volume: Option<f64>,
    /// Day-over-day change (%)
    pub change_pct: Option<f64>,
    pub quoted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub extras: Value,
}

/// Tagged union over the typed records. Recommendation payloads are
/// produced by downstream analytics and pass through uncleaned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum Record {
    Weather(WeatherRecord),
    Soil(SoilRecord),
    Crop(CropRecord),
    Market(MarketRecord),
    Recommendation { data: Value },
}

impl Record {
    pub fn category(&self) -> DataCategory {
        match self {
            Self::Weather(_) => DataCategory::Weather,
            Self::Soil(_) => DataCategory::Soil,
            Self::Crop(_) => DataCategory::Crop,
            Self::Market(_) => DataCategory::Market,
            Self::Recommendation { .. } => DataCategory::Recommendation,
        }
    }

    /// Number of expected domain fields for completeness scoring.
    pub fn expected_field_count(&self) -> usize {
        match self {
            Self::Weather(_) => 5,
            Self::Soil(_) => 6,
            Self::Crop(_) => 4,
            Self::Market(_) => 4,
            Self::Recommendation { .. } => 0,
        }
    }

    /// Number of expected fields actually present (non-`None`).
    pub fn present_field_count(&self) -> usize {
        fn c(fields: &[bool]) -> usize {
            fields.iter().filter(|p| **p).count()
        }
        match self {
            Self::Weather(w) => c(&[
                w.temperature_f.is_some(),
                w.humidity_pct.is_some(),
                w.wind_mph.is_some(),
                w.precipitation_in.is_some(),
                w.pressure_inhg.is_some(),
            ]),
            Self::Soil(s) => c(&[
                s.ph.is_some(),
                s.organic_matter_pct.is_some(),
                s.moisture_pct.is_some(),
                s.nitrogen_ppm.is_some(),
                s.phosphorus_ppm.is_some(),
                s.potassium_ppm.is_some(),
            ]),
            Self::Crop(cr) => c(&[
                cr.crop.is_some(),
                cr.yield_bu_ac.is_some(),
                cr.grain_moisture_pct.is_some(),
                cr.growth_stage.is_some(),
            ]),
            Self::Market(m) => c(&[
                m.commodity.is_some(),
                m.price_usd.is_some(),
                m.volume.is_some(),
                m.change_pct.is_some(),
            ]),
            Self::Recommendation { .. } => 0,
        }
    }

    /// Whether the record carries any data at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Recommendation { data } => data.is_null(),
            _ => self.present_field_count() == 0,
        }
    }
}
