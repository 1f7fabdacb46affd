//! Cache Metrics System
//!
//! Counters describing what a cache has been doing, reported as a
//! `BTreeMap<String, f64>` so the output has a stable, alphabetical key order.
//!
//! [`CoreCacheMetrics`] holds the counters any key/value cache has (requests,
//! hits, insertions, evictions, ...). [`LfuCacheMetrics`] extends it with the
//! frequency-bucket and notification-sink counters specific to this crate.
//!
//! Metrics are updated under the cache lock as a side effect of each
//! operation and read back through the [`CacheMetrics`] trait.

use std::collections::BTreeMap;

pub mod lfu;

pub use lfu::LfuCacheMetrics;

/// Common counters tracked by every cache.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreCacheMetrics {
    /// Total number of lookups (`get`, `get_with`)
    pub requests: u64,

    /// Lookups that found their key
    pub cache_hits: u64,

    /// New keys stored
    pub insertions: u64,

    /// Existing keys overwritten
    pub updates: u64,

    /// Keys removed through `delete`
    pub deletions: u64,

    /// Entries removed by `evict` or by bounds eviction
    pub evictions: u64,
}

impl CoreCacheMetrics {
    /// Creates zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a lookup that found its key.
    pub fn record_hit(&mut self) {
        self.requests += 1;
        self.cache_hits += 1;
    }

    /// Records a lookup that did not find its key.
    pub fn record_miss(&mut self) {
        self.requests += 1;
    }

    /// Records a new key.
    pub fn record_insertion(&mut self) {
        self.insertions += 1;
    }

    /// Records an overwrite of an existing key.
    pub fn record_update(&mut self) {
        self.updates += 1;
    }

    /// Records an explicit removal.
    pub fn record_deletion(&mut self) {
        self.deletions += 1;
    }

    /// Records an eviction.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Fraction of lookups that hit, between 0.0 and 1.0.
    pub fn hit_rate(&self) -> f64 {
        if self.requests > 0 {
            self.cache_hits as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Fraction of lookups that missed, between 0.0 and 1.0.
    pub fn miss_rate(&self) -> f64 {
        if self.requests > 0 {
            (self.requests - self.cache_hits) as f64 / self.requests as f64
        } else {
            0.0
        }
    }

    /// Converts the counters to a `BTreeMap` for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.cache_hits as f64);
        metrics.insert(
            "cache_misses".to_string(),
            (self.requests - self.cache_hits) as f64,
        );
        metrics.insert("deletions".to_string(), self.deletions as f64);
        metrics.insert("evictions".to_string(), self.evictions as f64);
        metrics.insert("insertions".to_string(), self.insertions as f64);
        metrics.insert("requests".to_string(), self.requests as f64);
        metrics.insert("updates".to_string(), self.updates as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());
        metrics.insert("miss_rate".to_string(), self.miss_rate());

        if self.insertions > 0 {
            metrics.insert(
                "eviction_rate".to_string(),
                self.evictions as f64 / self.insertions as f64,
            );
        }

        metrics
    }
}

/// Uniform metrics reporting interface.
pub trait CacheMetrics {
    /// Returns all metrics as key-value pairs in deterministic order.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Algorithm name for identification.
    fn algorithm_name(&self) -> &'static str;
}
