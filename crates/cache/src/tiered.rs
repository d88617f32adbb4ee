//! The two-tier cache: in-process L1 in front of a shared remote L2.

use regex::Regex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

use agro_core::{DataCategory, Error, IngestedDocument};

use crate::compression::{decompress_if_needed, maybe_compress};
use crate::config::CacheConfig;
use crate::l1::L1Cache;
use crate::policy::{InvalidationPolicy, SeasonState};
use crate::remote::RemoteStore;
use crate::stats::{CacheStats, CacheStatsSnapshot};

/// Tiered cache engine. Remote-store failures degrade every operation to
/// L1-only; callers never see a `CacheBackend` error from `get`/`set`.
pub struct TieredCache {
    config: CacheConfig,
    l1: L1Cache,
    remote: Arc<dyn RemoteStore>,
    stats: CacheStats,
    season: SeasonState,
}

impl TieredCache {
    pub fn new(config: CacheConfig, remote: Arc<dyn RemoteStore>) -> Self {
        let l1 = L1Cache::new(&config);
        Self {
            config,
            l1,
            remote,
            stats: CacheStats::new(),
            season: SeasonState::new(),
        }
    }

    /// Current-season tag for the seasonal invalidation policy.
    pub fn season(&self) -> SeasonState {
        self.season.clone()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// L1 then L2; an L2 hit is promoted into L1 with the category TTL.
    pub async fn get(&self, key: &str, category: DataCategory) -> Option<IngestedDocument> {
        let started = Instant::now();
        let result = self.get_inner(key, category).await;
        self.stats
            .get_latency_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
        match &result {
            Some(_) => self.stats.hits.inc(),
            None => self.stats.misses.inc(),
        }
        result
    }

    async fn get_inner(&self, key: &str, category: DataCategory) -> Option<IngestedDocument> {
        let (hit, expired) = self.l1.get(key);
        if expired {
            self.stats.expired.inc();
        }
        if let Some(doc) = hit {
            self.stats.l1_hits.inc();
            return Some((*doc).clone());
        }

        let bytes = match timeout(self.config.remote_timeout(), self.remote.get(key)).await {
            Ok(Ok(bytes)) => bytes,
            Ok(Err(e)) => {
                self.remote_degraded("get", key, &e);
                None
            }
            Err(_) => {
                self.remote_timeout_degraded("get", key);
                None
            }
        }?;

        let doc: IngestedDocument = match decompress_if_needed(bytes)
            .and_then(|raw| serde_json::from_slice(&raw).map_err(Error::from))
        {
            Ok(doc) => doc,
            Err(e) => {
                warn!(key = %key, error = %e, "dropping undecodable remote cache entry");
                let _ = self.remote.delete(std::slice::from_ref(&key.to_string())).await;
                return None;
            }
        };

        self.stats.l2_hits.inc();
        self.promote(key, &doc, category);
        Some(doc)
    }

    /// Write to both tiers using the category's configured TTL.
    pub async fn set(&self, key: &str, doc: &IngestedDocument, category: DataCategory) {
        let ttl = self.config.ttl_for(category);
        self.set_with_ttl(key, doc, category, ttl).await;
    }

    /// Write to both tiers with an explicit TTL (sources may override the
    /// category default).
    pub async fn set_with_ttl(
        &self,
        key: &str,
        doc: &IngestedDocument,
        category: DataCategory,
        ttl: Duration,
    ) {
        let started = Instant::now();
        let serialized = match serde_json::to_vec(doc) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to serialize payload for cache");
                return;
            }
        };

        let outcome = self.l1.insert(
            key,
            Arc::new(doc.clone()),
            serialized.len(),
            ttl,
            category,
        );
        self.stats.evictions.inc_by(outcome.evictions);

        let (stored_bytes, compressed) =
            maybe_compress(&serialized, self.config.compression_threshold_bytes);
        if compressed {
            debug!(
                key = %key,
                raw = serialized.len(),
                stored = stored_bytes.len(),
                "compressed payload for remote storage"
            );
        }

        match timeout(
            self.config.remote_timeout(),
            self.remote.set(key, &stored_bytes, ttl),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.remote_degraded("set", key, &e),
            Err(_) => self.remote_timeout_degraded("set", key),
        }

        self.stats.sets.inc();
        self.stats
            .set_latency_ms
            .observe(started.elapsed().as_secs_f64() * 1000.0);
    }

    /// Remove one key from both tiers; returns how many tier entries
    /// existed.
    pub async fn delete(&self, key: &str) -> u64 {
        let mut removed = u64::from(self.l1.remove(key));

        match timeout(
            self.config.remote_timeout(),
            self.remote.delete(std::slice::from_ref(&key.to_string())),
        )
        .await
        {
            Ok(Ok(n)) => removed += n,
            Ok(Err(e)) => self.remote_degraded("delete", key, &e),
            Err(_) => self.remote_timeout_degraded("delete", key),
        }

        self.stats.deletes.inc_by(removed);
        removed
    }

    /// Remove every entry matching a glob pattern (e.g. `agro:noaa:*`)
    /// from both tiers; returns the count removed.
    pub async fn clear_by_pattern(&self, glob: &str) -> u64 {
        let mut removed = match glob_to_regex(glob) {
            Ok(re) => self.l1.remove_matching(&re),
            Err(e) => {
                warn!(pattern = %glob, error = %e, "invalid clear pattern");
                return 0;
            }
        };

        let remote_removed = async {
            let keys = self.remote.keys(glob).await?;
            self.remote.delete(&keys).await
        };
        match timeout(self.config.remote_timeout(), remote_removed).await {
            Ok(Ok(n)) => removed += n,
            Ok(Err(e)) => self.remote_degraded("clear_by_pattern", glob, &e),
            Err(_) => self.remote_timeout_degraded("clear_by_pattern", glob),
        }

        self.stats.deletes.inc_by(removed);
        removed
    }

    /// One invalidation pass: drop every L1 entry any policy rejects.
    /// The remote tier expires through its own TTLs.
    pub fn sweep_once(&self, policies: &[Arc<dyn InvalidationPolicy>]) -> u64 {
        let invalidated = self
            .l1
            .invalidate_where(|view| policies.iter().any(|p| p.should_invalidate(view)));
        if invalidated > 0 {
            debug!(invalidated, "cache sweep invalidated entries");
            self.stats.expired.inc_by(invalidated);
        }
        invalidated
    }

    /// Whether the remote backend answers a ping within the remote
    /// timeout.
    pub async fn backend_healthy(&self) -> bool {
        matches!(
            timeout(self.config.remote_timeout(), self.remote.ping()).await,
            Ok(Ok(()))
        )
    }

    pub fn contains_l1(&self, key: &str) -> bool {
        self.l1.contains(key)
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot(self.l1.category_usage())
    }

    fn promote(&self, key: &str, doc: &IngestedDocument, category: DataCategory) {
        let size = serde_json::to_vec(doc).map(|b| b.len()).unwrap_or(0);
        let ttl = self.config.ttl_for(category);
        let outcome = self.l1.insert(key, Arc::new(doc.clone()), size, ttl, category);
        self.stats.evictions.inc_by(outcome.evictions);
    }

    fn remote_degraded(&self, op: &str, key: &str, err: &Error) {
        self.stats.remote_failures.inc();
        warn!(op, key = %key, error = %err, "remote cache unavailable, degrading to L1 only");
    }

    fn remote_timeout_degraded(&self, op: &str, key: &str) {
        self.stats.remote_failures.inc();
        warn!(
            op,
            key = %key,
            timeout_ms = self.config.remote_timeout_ms,
            "remote cache timed out, degrading to L1 only"
        );
    }
}

/// Compile a glob (`*` and `?` wildcards) into an anchored regex.
fn glob_to_regex(glob: &str) -> std::result::Result<Regex, regex::Error> {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_translates_wildcards() {
        let re = glob_to_regex("agro:noaa:*").unwrap();
        assert!(re.is_match("agro:noaa:current:abcd1234"));
        assert!(!re.is_match("agro:usda:survey:abcd1234"));

        let re = glob_to_regex("agro:?:x").unwrap();
        assert!(re.is_match("agro:a:x"));
        assert!(!re.is_match("agro:ab:x"));
    }

    #[test]
    fn glob_escapes_regex_metacharacters() {
        let re = glob_to_regex("a.b+c:*").unwrap();
        assert!(re.is_match("a.b+c:anything"));
        assert!(!re.is_match("aXb+c:anything"));
    }
}
