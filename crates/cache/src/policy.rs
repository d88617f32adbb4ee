//! Pluggable invalidation policies, evaluated by the background sweep.
//!
//! A sweep invalidates any entry for which *any* policy returns true.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agro_core::category::Season;
use agro_core::DataCategory;

use crate::config::CacheConfig;
use crate::entry::EntryView;

/// Decides whether an entry should be dropped ahead of normal access-time
/// expiry.
pub trait InvalidationPolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn should_invalidate(&self, entry: &EntryView) -> bool;
}

/// Plain TTL expiry.
pub struct TtlPolicy;

impl InvalidationPolicy for TtlPolicy {
    fn name(&self) -> &'static str {
        "ttl"
    }

    fn should_invalidate(&self, entry: &EntryView) -> bool {
        entry.age > entry.ttl
    }
}

/// Externally supplied "current season" tag, shared between the cache
/// owner (who sets it) and the seasonal policy (who reads it).
#[derive(Clone, Default)]
pub struct SeasonState(Arc<RwLock<Option<Season>>>);

impl SeasonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, season: Season) {
        *self.0.write() = Some(season);
    }

    pub fn get(&self) -> Option<Season> {
        *self.0.read()
    }
}

/// Scales effective TTL by a per-season multiplier. During the growing
/// season weather data goes stale faster than its nominal TTL; over
/// winter it lasts longer.
pub struct SeasonalPolicy {
    multipliers: HashMap<Season, f64>,
    season: SeasonState,
}

impl SeasonalPolicy {
    pub fn new(multipliers: HashMap<Season, f64>, season: SeasonState) -> Self {
        Self {
            multipliers,
            season,
        }
    }

    pub fn from_config(config: &CacheConfig, season: SeasonState) -> Self {
        Self::new(config.seasonal_multipliers.clone(), season)
    }
}

impl InvalidationPolicy for SeasonalPolicy {
    fn name(&self) -> &'static str {
        "seasonal"
    }

    fn should_invalidate(&self, entry: &EntryView) -> bool {
        let Some(season) = self.season.get() else {
            return false;
        };
        let Some(multiplier) = self.multipliers.get(&season) else {
            return false;
        };
        let effective = entry.ttl.mul_f64(*multiplier);
        entry.age > effective
    }
}

/// Hard per-category max age, overriding TTL when shorter.
pub struct FreshnessPolicy {
    max_age: HashMap<DataCategory, Duration>,
}

impl FreshnessPolicy {
    pub fn new(max_age: HashMap<DataCategory, Duration>) -> Self {
        Self { max_age }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            config
                .freshness_max_age_secs
                .iter()
                .map(|(cat, secs)| (*cat, Duration::from_secs(*secs)))
                .collect(),
        )
    }
}

impl InvalidationPolicy for FreshnessPolicy {
    fn name(&self) -> &'static str {
        "freshness"
    }

    fn should_invalidate(&self, entry: &EntryView) -> bool {
        match self.max_age.get(&entry.category) {
            Some(max_age) => entry.age > *max_age,
            None => false,
        }
    }
}

/// Build the standard policy set from configuration.
pub fn standard_policies(
    config: &CacheConfig,
    season: SeasonState,
) -> Vec<Arc<dyn InvalidationPolicy>> {
    vec![
        Arc::new(TtlPolicy),
        Arc::new(SeasonalPolicy::from_config(config, season)),
        Arc::new(FreshnessPolicy::from_config(config)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(age_secs: u64, ttl_secs: u64, category: DataCategory) -> EntryView {
        EntryView {
            age: Duration::from_secs(age_secs),
            ttl: Duration::from_secs(ttl_secs),
            category,
        }
    }

    #[test]
    fn ttl_policy_fires_past_ttl() {
        assert!(!TtlPolicy.should_invalidate(&view(30, 60, DataCategory::Weather)));
        assert!(TtlPolicy.should_invalidate(&view(90, 60, DataCategory::Weather)));
    }

    #[test]
    fn seasonal_policy_scales_ttl() {
        let season = SeasonState::new();
        let policy = SeasonalPolicy::new(HashMap::from([(Season::Summer, 0.5)]), season.clone());

        // No season set: policy abstains.
        assert!(!policy.should_invalidate(&view(40, 60, DataCategory::Weather)));

        // Summer halves the effective TTL: 40s > 30s.
        season.set(Season::Summer);
        assert!(policy.should_invalidate(&view(40, 60, DataCategory::Weather)));
        assert!(!policy.should_invalidate(&view(20, 60, DataCategory::Weather)));
    }

    #[test]
    fn freshness_policy_is_category_scoped() {
        let policy = FreshnessPolicy::new(HashMap::from([(
            DataCategory::Market,
            Duration::from_secs(120),
        )]));
        assert!(policy.should_invalidate(&view(300, 3600, DataCategory::Market)));
        assert!(!policy.should_invalidate(&view(300, 3600, DataCategory::Soil)));
    }
}
