//! Multi-tier cache engine for the AgroData ingestion pipeline.
//!
//! Two layers queried in order: an in-process bounded LRU store (L1) and
//! a shared remote key-value store (L2). Remote outages degrade to
//! L1-only operation; they never fail the caller.

pub mod compression;
pub mod config;
pub mod entry;
pub mod l1;
pub mod policy;
pub mod remote;
pub mod stats;
pub mod sweep;
pub mod tiered;

pub use config::CacheConfig;
pub use entry::{CacheEntry, EntryView};
pub use l1::L1Cache;
pub use policy::{
    standard_policies, FreshnessPolicy, InvalidationPolicy, SeasonState, SeasonalPolicy, TtlPolicy,
};
pub use remote::{RedisStore, RemoteStore};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use sweep::spawn_sweep;
pub use tiered::TieredCache;
