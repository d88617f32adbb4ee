//! Data categories and their per-category cache defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Category of agricultural data flowing through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataCategory {
    Weather,
    Soil,
    Crop,
    Market,
    Recommendation,
}

impl DataCategory {
    pub const ALL: [DataCategory; 5] = [
        Self::Weather,
        Self::Soil,
        Self::Crop,
        Self::Market,
        Self::Recommendation,
    ];

    /// Default cache TTL. Weather changes hourly, soil surveys are stable
    /// for days, market feeds go stale in minutes.
    pub fn default_ttl(&self) -> Duration {
        match self {
            Self::Weather => Duration::from_secs(10 * 60),
            Self::Soil => Duration::from_secs(24 * 60 * 60),
            Self::Crop => Duration::from_secs(60 * 60),
            Self::Market => Duration::from_secs(5 * 60),
            Self::Recommendation => Duration::from_secs(30 * 60),
        }
    }

    /// Default L1 byte budget for this category.
    pub fn default_l1_capacity_bytes(&self) -> usize {
        match self {
            Self::Weather => 4 * 1024 * 1024,
            Self::Soil => 8 * 1024 * 1024,
            Self::Crop => 4 * 1024 * 1024,
            Self::Market => 2 * 1024 * 1024,
            Self::Recommendation => 2 * 1024 * 1024,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Soil => "soil",
            Self::Crop => "crop",
            Self::Market => "market",
            Self::Recommendation => "recommendation",
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season tag supplied by the caller, used by the seasonal invalidation
/// policy to scale effective TTLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "spring",
            Self::Summer => "summer",
            Self::Fall => "fall",
            Self::Winter => "winter",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_ttl_is_shortest() {
        for cat in DataCategory::ALL {
            if cat != DataCategory::Market {
                assert!(DataCategory::Market.default_ttl() <= cat.default_ttl());
            }
        }
    }
}
