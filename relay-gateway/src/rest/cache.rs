//! Short-lived response cache for REST requests.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Cache key: exchange, endpoint and parameters sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    exchange: String,
    endpoint: String,
    params: Vec<(String, String)>,
}

impl CacheKey {
    /// Builds a key. Parameter order does not matter.
    #[must_use]
    pub fn new(exchange: &str, endpoint: &str, params: &[(String, String)]) -> Self {
        let mut params = params.to_vec();
        params.sort();
        Self {
            exchange: exchange.to_string(),
            endpoint: endpoint.to_string(),
            params,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.exchange, self.endpoint)?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{key}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct CacheEntry {
    payload: Value,
    inserted: Instant,
}

/// TTL cache of successful JSON responses.
///
/// Expired entries are purged lazily on lookup and on insert.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached payload if it is younger than the TTL.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        let mut entries = self.entries.lock();
        let fresh = entries
            .get(key)
            .map(|entry| entry.inserted.elapsed() < self.ttl)?;
        if fresh {
            entries.get(key).map(|entry| entry.payload.clone())
        } else {
            entries.remove(key);
            None
        }
    }

    /// Stores a payload.
    pub fn insert(&self, key: CacheKey, payload: Value) {
        let mut entries = self.entries.lock();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                payload,
                inserted: Instant::now(),
            },
        );
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, including ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Returns the TTL.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_key_ignores_param_order() {
        let a = CacheKey::new("bybit", "/v5/market/kline", &params(&[("symbol", "BTCUSDT"), ("interval", "1")]));
        let b = CacheKey::new("bybit", "/v5/market/kline", &params(&[("interval", "1"), ("symbol", "BTCUSDT")]));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "bybit:/v5/market/kline?interval=1&symbol=BTCUSDT");
    }

    #[test]
    fn test_key_differs_by_exchange() {
        let a = CacheKey::new("bybit", "/x", &[]);
        let b = CacheKey::new("other", "/x", &[]);
        assert_ne!(a, b);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(30));
        let key = CacheKey::new("bybit", "/v5/account/wallet-balance", &[]);
        cache.insert(key.clone(), json!({"retCode": 0}));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert_eq!(cache.get(&key), Some(json!({"retCode": 0})));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&key), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::new(Duration::from_secs(30));
        cache.insert(CacheKey::new("bybit", "/a", &[]), json!(1));
        cache.insert(CacheKey::new("bybit", "/b", &[]), json!(2));
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }
}
