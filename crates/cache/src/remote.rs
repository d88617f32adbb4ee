//! Remote (L2) store contract and the Redis implementation.

use async_trait::async_trait;
use std::time::Duration;

use agro_core::{Error, Result};

/// Shared remote key-value store: GET / SET-with-TTL / DELETE /
/// KEYS-by-pattern / PING.
///
/// Implementations must be safe to call concurrently. Errors map to
/// [`Error::CacheBackend`]; the tiered cache absorbs them (fail-open).
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
    /// Delete keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64>;
    /// List keys matching a glob pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;
    async fn ping(&self) -> Result<()>;
}

/// Redis-backed remote store over a multiplexed async connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: redis::aio::MultiplexedConnection,
}

impl RedisStore {
    /// Connect to Redis at the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::cache_backend(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| Error::cache_backend(format!("redis connect failed: {e}")))?;
        Ok(Self { conn })
    }
}

fn backend_err(e: redis::RedisError) -> Error {
    Error::cache_backend(e.to_string())
}

#[async_trait]
impl RemoteStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(backend_err)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<()>(&mut conn)
            .await
            .map_err(backend_err)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(backend_err)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        redis::cmd("KEYS")
            .arg(pattern)
            .query_async(&mut conn)
            .await
            .map_err(backend_err)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(backend_err)
    }
}
