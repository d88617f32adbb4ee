//! Source adapter contract.

use async_trait::async_trait;
use std::collections::BTreeMap;

use agro_core::{Record, Result};

/// One external data provider, registered under a logical source name.
///
/// Implementations wrap concrete third-party clients (weather APIs, soil
/// surveys, market feeds). They must be safe to call concurrently and
/// must return an error rather than silently returning partial data;
/// provider responses are deserialized into typed [`Record`]s at this
/// boundary.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(
        &self,
        operation: &str,
        params: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Record>;
}
