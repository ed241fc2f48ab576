//! TTL cache of response payloads.

use std::sync::Arc;
use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use serde_json::Value;
use tokio::time::Instant;
use tracing::debug;

use super::InvalidationPattern;
use crate::telemetry;

/// Default time-to-live for cached responses: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Configuration for the response cache.
///
/// ```rust
/// # use satchel::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(2_000)
///     .ttl(Duration::from_secs(60));
/// assert_eq!(config.ttl, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 1,000.
    pub max_entries: u64,
    /// Time-to-live for cached entries. Default: [`DEFAULT_TTL`].
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: DEFAULT_TTL,
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// A cached response payload and the instant it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub payload: Arc<Value>,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// In-memory response cache.
///
/// Thread-safe (moka handles concurrent access internally). Timestamps
/// come from `tokio::time`, so a paused test clock controls expiry.
pub struct CacheStore {
    entries: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl CacheStore {
    /// Create an empty cache from the given configuration.
    ///
    /// At capacity the least recently used entry is evicted, so a `put`
    /// is always kept.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = Cache::builder()
            .max_capacity(config.max_entries)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self {
            entries,
            ttl: config.ttl,
        }
    }

    /// Time-to-live applied on lookup.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a payload.
    ///
    /// Returns `None` when the key is absent or older than the TTL. Stale
    /// entries stay in place until overwritten or invalidated.
    pub fn get(&self, key: &str) -> Option<Arc<Value>> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(self.ttl) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                debug!(key, "cache hit");
                Some(entry.payload)
            }
            _ => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Whether a fresh entry exists for `key`, without touching metrics.
    pub fn contains_fresh(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| entry.is_fresh(self.ttl))
    }

    /// Insert (or overwrite) a payload with a fresh timestamp.
    pub fn put(&self, key: impl Into<String>, payload: Arc<Value>) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                payload,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove a single entry. No-op if absent.
    pub fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }

    /// Remove every entry whose key matches `pattern`.
    ///
    /// Returns the number of entries removed.
    pub fn invalidate_by_pattern(&self, pattern: InvalidationPattern) -> usize {
        metrics::counter!(telemetry::CACHE_INVALIDATIONS_TOTAL, "pattern" => pattern.name())
            .increment(1);
        if pattern.is_wildcard() {
            let removed = self.len();
            self.clear();
            return removed;
        }
        let doomed: Vec<Arc<String>> = self
            .entries
            .iter()
            .filter(|(key, _)| pattern.matches(key))
            .map(|(key, _)| key)
            .collect();
        for key in &doomed {
            self.entries.invalidate(key.as_str());
        }
        debug!(pattern = pattern.name(), removed = doomed.len(), "cache invalidated");
        doomed.len()
    }

    /// Evict all entries.
    pub fn clear(&self) {
        // `invalidate_all()` also hides entries written in the same tick.
        let keys: Vec<Arc<String>> = self.entries.iter().map(|(key, _)| key).collect();
        for key in &keys {
            self.entries.invalidate(key.as_str());
        }
    }

    /// Keys currently held, stale ones included.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(key, _)| (*key).clone())
            .collect()
    }

    /// Number of entries currently held, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

/// Compute a cache key from method, URL, and JSON body.
///
/// Mutations with different bodies never collide, and GETs with
/// different query strings are different keys.
pub fn cache_key(method: &str, url: &str, body: Option<&Value>) -> String {
    match body {
        Some(body) => format!("{method}:{url}:{body}"),
        None => format!("{method}:{url}:"),
    }
}
