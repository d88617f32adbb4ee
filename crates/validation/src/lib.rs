//! Validation and cleaning pipeline.
//!
//! One cleaner per data category applies an ordered set of field rules:
//! physically-implausible values are removed (Critical), out-of-bounds
//! but plausible values are corrected, atypical values are flagged. The
//! output is a cleaned record, the issue list, and a quality score.

pub mod cleaner;
pub mod crop;
pub mod market;
pub mod quality;
pub mod rules;
pub mod soil;
pub mod weather;

pub use cleaner::{CategoryCleaner, Cleaner};
pub use crop::CropCleaner;
pub use market::MarketCleaner;
pub use soil::SoilCleaner;
pub use weather::WeatherCleaner;
