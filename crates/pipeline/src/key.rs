//! Cache key generation.
//!
//! Keys are namespaced as `<namespace>:<source>:<operation>:<hash8>`
//! where `hash8` is the first 8 hex chars of a SHA-256 over the params
//! in sorted-key order. Using a `BTreeMap` makes the hash
//! order-independent by construction.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Stable cache key for an ingestion request.
pub fn cache_key(
    namespace: &str,
    source: &str,
    operation: &str,
    params: &BTreeMap<String, serde_json::Value>,
) -> String {
    let mut hasher = Sha256::new();
    for (k, v) in params {
        hasher.update(k.as_bytes());
        hasher.update([0u8]);
        hasher.update(v.to_string().as_bytes());
        hasher.update([0u8]);
    }
    let digest = hasher.finalize();
    let hash8: String = digest[..4].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}:{}:{}:{}", namespace, source, operation, hash8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_is_invariant_under_insertion_order() {
        let mut a = BTreeMap::new();
        a.insert("lat".to_string(), json!(42.03));
        a.insert("lon".to_string(), json!(-93.63));

        let mut b = BTreeMap::new();
        b.insert("lon".to_string(), json!(-93.63));
        b.insert("lat".to_string(), json!(42.03));

        assert_eq!(
            cache_key("agro", "noaa", "current", &a),
            cache_key("agro", "noaa", "current", &b)
        );
    }

    #[test]
    fn key_shape_and_distinctness() {
        let mut params = BTreeMap::new();
        params.insert("lat".to_string(), json!(42.03));
        let key = cache_key("agro", "noaa", "current", &params);

        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts[..3], ["agro", "noaa", "current"]);
        assert_eq!(parts[3].len(), 8);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit()));

        params.insert("lon".to_string(), json!(-93.63));
        assert_ne!(key, cache_key("agro", "noaa", "current", &params));
    }

    #[test]
    fn adjacent_params_do_not_collide() {
        // ("ab", "c") must differ from ("a", "bc").
        let mut a = BTreeMap::new();
        a.insert("ab".to_string(), json!("c"));
        let mut b = BTreeMap::new();
        b.insert("a".to_string(), json!("bc"));
        assert_ne!(
            cache_key("agro", "s", "op", &a),
            cache_key("agro", "s", "op", &b)
        );
    }
}
