//! LRU+TTL response cache, policy-gated to GET/2xx. Keyed by a SHA-256
//! fingerprint of method, path, canonicalized query, cache-varying
//! headers, and body — grounded on the same `sha2`-based fingerprinting
//! idiom the teacher uses for on-disk response cache keys, adapted to
//! an in-memory LRU.

use crate::constants::{CACHE_DEFAULT_TTL_SECS, CACHE_HEALTHY_HIT_RATE, CACHE_HEALTH_MIN_SAMPLES, CACHE_MAX_ENTRIES};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: serde_json::Value,
    expires_at: Instant,
    last_access: Instant,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        let total = self.hits + self.misses;
        total < CACHE_HEALTH_MIN_SAMPLES || self.hit_rate() >= CACHE_HEALTHY_HIT_RATE
    }
}

struct Inner {
    entries: HashMap<String, Entry>,
    stats: CacheStats,
}

pub struct ResponseCache {
    ttl: Duration,
    max_entries: usize,
    inner: Mutex<Inner>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(CACHE_DEFAULT_TTL_SECS), CACHE_MAX_ENTRIES)
    }
}

impl ResponseCache {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self { ttl, max_entries, inner: Mutex::new(Inner { entries: HashMap::new(), stats: CacheStats::default() }) }
    }

    /// Whether an outcome should be cached at all: only `GET` requests
    /// with a `2xx` status.
    #[must_use]
    pub const fn should_cache(method_is_get: bool, status: u16) -> bool {
        method_is_get && status >= 200 && status < 300
    }

    /// Computes the canonical cache key for a request.
    #[must_use]
    pub fn fingerprint(method: &str, path: &str, query: &[(String, String)], varying_headers: &[(String, String)], body: Option<&serde_json::Value>, account_key: Option<&str>) -> String {
        let mut sorted_query = query.to_vec();
        sorted_query.sort();
        let mut sorted_headers = varying_headers.to_vec();
        sorted_headers.sort();

        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(b"\0");
        hasher.update(path.as_bytes());
        hasher.update(b"\0");
        for (k, v) in &sorted_query {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }
        hasher.update(b"\0");
        for (k, v) in &sorted_headers {
            hasher.update(k.as_bytes());
            hasher.update(b":");
            hasher.update(v.as_bytes());
            hasher.update(b";");
        }
        hasher.update(b"\0");
        if let Some(b) = body {
            hasher.update(b.to_string().as_bytes());
        }
        hasher.update(b"\0");
        if let Some(k) = account_key {
            hasher.update(k.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();
        let expired = inner.entries.get(key).is_some_and(|e| e.expires_at <= now);
        if expired {
            inner.entries.remove(key);
        }
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.last_access = now;
            let value = entry.value.clone();
            inner.stats.hits += 1;
            Some(value)
        } else {
            inner.stats.misses += 1;
            None
        }
    }

    pub fn set(&self, key: String, value: serde_json::Value) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let now = Instant::now();

        let ttl = self.ttl;
        inner.entries.retain(|_, e| e.expires_at > now);

        if inner.entries.len() >= self.max_entries && !inner.entries.contains_key(&key) {
            if let Some(lru_key) = inner.entries.iter().min_by_key(|(_, e)| e.last_access).map(|(k, _)| k.clone()) {
                inner.entries.remove(&lru_key);
                inner.stats.evictions += 1;
            }
        }

        inner.entries.insert(key, Entry { value, expires_at: now + ttl, last_access: now });
    }

    pub fn invalidate(&self, key: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.remove(key);
    }

    /// Removes every entry whose key matches `pattern`.
    pub fn invalidate_pattern(&self, pattern: &Regex) {
        let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.retain(|k, _| !pattern.is_match(k));
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.stats
    }

    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
