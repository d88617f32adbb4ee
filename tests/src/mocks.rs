//! Mock implementations for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use agro_cache::RemoteStore;
use agro_core::{Error, Record, Result};
use agro_pipeline::{Params, SourceAdapter};

/// Mock source adapter that serves a canned record and captures calls.
///
/// Implements the same `SourceAdapter` trait as real provider adapters,
/// so tests can drive the full pipeline without any upstream service.
pub struct MockAdapter {
    record: Mutex<Record>,
    calls: Mutex<Vec<(String, Params)>>,
    /// Number of upcoming fetches that fail; `u32::MAX` fails forever.
    fail_remaining: Mutex<u32>,
    delay: Mutex<Option<Duration>>,
}

impl MockAdapter {
    pub fn new(record: Record) -> Arc<Self> {
        Arc::new(Self {
            record: Mutex::new(record),
            calls: Mutex::new(Vec::new()),
            fail_remaining: Mutex::new(0),
            delay: Mutex::new(None),
        })
    }

    /// Replace the record served by subsequent fetches.
    pub fn set_record(&self, record: Record) {
        *self.record.lock() = record;
    }

    /// Fail the next `n` fetches with an adapter error.
    pub fn fail_times(&self, n: u32) {
        *self.fail_remaining.lock() = n;
    }

    pub fn always_fail(&self) {
        *self.fail_remaining.lock() = u32::MAX;
    }

    /// Sleep this long inside each fetch, for timeout and cancellation
    /// tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl SourceAdapter for MockAdapter {
    async fn fetch(&self, operation: &str, params: &Params) -> Result<Record> {
        self.calls
            .lock()
            .push((operation.to_string(), params.clone()));

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        {
            let mut remaining = self.fail_remaining.lock();
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(Error::adapter("mock", "simulated upstream failure"));
            }
        }

        Ok(self.record.lock().clone())
    }
}

/// In-memory `RemoteStore` with TTL expiry and a failure toggle, standing
/// in for Redis.
#[derive(Default)]
pub struct MemoryRemoteStore {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
    failing: Mutex<bool>,
}

impl MemoryRemoteStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// While failing, every operation returns a backend error.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self) -> Result<()> {
        if *self.failing.lock() {
            Err(Error::cache_backend("simulated remote outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check()?;
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((bytes, expires)) if *expires > Instant::now() => Ok(Some(bytes.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        self.check()?;
        self.entries
            .lock()
            .insert(key.to_string(), (value.to_vec(), Instant::now() + ttl));
        Ok(())
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        self.check()?;
        let mut entries = self.entries.lock();
        Ok(keys.iter().filter(|k| entries.remove(*k).is_some()).count() as u64)
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.check()?;
        let re = glob_to_regex(pattern);
        Ok(self
            .entries
            .lock()
            .keys()
            .filter(|k| re.is_match(k))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check()
    }
}

fn glob_to_regex(glob: &str) -> Regex {
    let mut pattern = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            c => pattern.push_str(&regex::escape(&c.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).expect("glob produced invalid regex")
}
