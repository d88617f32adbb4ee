//! Canned records and request parameters.

use chrono::Utc;
use serde_json::json;

use agro_core::{MarketRecord, Record, SoilRecord, WeatherRecord};
use agro_pipeline::Params;

/// A clean weather observation that passes every rule.
pub fn weather_record() -> Record {
    Record::Weather(WeatherRecord {
        temperature_f: Some(72.5),
        humidity_pct: Some(54.0),
        wind_mph: Some(8.0),
        precipitation_in: Some(0.0),
        pressure_inhg: Some(29.92),
        observed_at: Some(Utc::now()),
        ..Default::default()
    })
}

/// Temperature far outside physical range; the cleaner must reject it.
pub fn implausible_weather_record() -> Record {
    Record::Weather(WeatherRecord {
        temperature_f: Some(250.0),
        humidity_pct: Some(54.0),
        observed_at: Some(Utc::now()),
        ..Default::default()
    })
}

/// Humidity slightly over 100%, a known sensor artifact the cleaner
/// clamps rather than drops.
pub fn correctable_weather_record() -> Record {
    Record::Weather(WeatherRecord {
        temperature_f: Some(70.0),
        humidity_pct: Some(105.0),
        observed_at: Some(Utc::now()),
        ..Default::default()
    })
}

pub fn market_record() -> Record {
    Record::Market(MarketRecord {
        commodity: Some("corn".to_string()),
        price_usd: Some(4.52),
        volume: Some(1250.0),
        change_pct: Some(1.2),
        quoted_at: Some(Utc::now()),
        ..Default::default()
    })
}

pub fn soil_record() -> Record {
    Record::Soil(SoilRecord {
        ph: Some(6.4),
        organic_matter_pct: Some(3.1),
        moisture_pct: Some(24.0),
        nitrogen_ppm: Some(18.0),
        sampled_at: Some(Utc::now()),
        ..Default::default()
    })
}

pub fn station_params(station: &str) -> Params {
    Params::from([("station".to_string(), json!(station))])
}

pub fn commodity_params(symbol: &str) -> Params {
    Params::from([("symbol".to_string(), json!(symbol))])
}
