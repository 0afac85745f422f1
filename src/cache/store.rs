//! In-memory request cache with freshness and throttle windows
//!
//! Two maps keyed by the fully qualified request URL: one holds the last
//! successful response body, the other the time of the last successful fetch.
//! Entries are only removed by [`RequestCache::clear`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use crate::config::CacheConfig;

/// A cached response body and the time it was stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Decoded JSON body
    pub data: Value,
    /// When the body was stored
    pub cached_at: DateTime<Utc>,
}

/// Serializable copy of both cache maps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Stored responses by resource key
    pub entries: HashMap<String, CacheEntry>,
    /// Last successful fetch by resource key
    pub last_fetch: HashMap<String, DateTime<Utc>>,
}

/// Keyed response store with a per-key fetch throttle
///
/// Freshness is advisory: an expired entry stays in the map and can still be
/// read with [`RequestCache::get_stale`], but [`RequestCache::get`] ignores it.
#[derive(Debug, Clone)]
pub struct RequestCache {
    entries: HashMap<String, CacheEntry>,
    last_fetch: HashMap<String, DateTime<Utc>>,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl RequestCache {
    /// Creates an empty cache using the system clock
    pub fn new(config: CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates an empty cache reading time from `clock`
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: HashMap::new(),
            last_fetch: HashMap::new(),
            config,
            clock,
        }
    }

    /// Replaces the contents of the cache with a previously taken snapshot
    pub fn restore(&mut self, snapshot: CacheSnapshot) {
        self.entries = snapshot.entries;
        self.last_fetch = snapshot.last_fetch;
    }

    /// Copies both maps out for persistence
    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            entries: self.entries.clone(),
            last_fetch: self.last_fetch.clone(),
        }
    }

    /// Returns the stored data for `key` if it is younger than the cache duration
    ///
    /// An entry stamped later than the current time (a snapshot written under a
    /// clock that ran ahead) is treated as expired rather than fresh.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entry = self.entries.get(key)?;
        match self.clock.elapsed_since(entry.cached_at) {
            Some(age) if age < self.config.cache_duration => Some(entry.data.clone()),
            _ => None,
        }
    }

    /// Returns the stored data for `key` regardless of age
    pub fn get_stale(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.data.clone())
    }

    /// Stores `data` under `key`, discarding whatever was there
    pub fn set(&mut self, key: &str, data: Value) {
        let entry = CacheEntry {
            data,
            cached_at: self.clock.now(),
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Whether a network fetch for `key` is allowed right now
    ///
    /// `force` always allows it. Otherwise the key must never have been
    /// fetched successfully, or its last fetch must be at least the minimum
    /// fetch interval ago. A last fetch stamped in the future does not throttle.
    pub fn can_fetch(&self, key: &str, force: bool) -> bool {
        if force {
            return true;
        }
        match self.last_fetch.get(key) {
            None => true,
            Some(&last) => match self.clock.elapsed_since(last) {
                Some(elapsed) => elapsed >= self.config.min_fetch_interval,
                None => true,
            },
        }
    }

    /// Records now as the last successful fetch of `key`
    pub fn update_last_fetch(&mut self, key: &str) {
        self.last_fetch.insert(key.to_string(), self.clock.now());
    }

    /// Empties both the response and throttle maps
    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_fetch.clear();
    }

    /// Number of stored responses, fresh or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no responses are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The policy this cache was built with
    pub fn config(&self) -> CacheConfig {
        self.config
    }
}
