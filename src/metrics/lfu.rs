//! LFU Cache Metrics
//!
//! Metrics specific to the frequency-bucket engine and its notification sinks.

use std::collections::BTreeMap;

use super::{CacheMetrics, CoreCacheMetrics};

/// LFU-specific metrics (extends CoreCacheMetrics)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LfuCacheMetrics {
    /// Core metrics common to all caches
    pub core: CoreCacheMetrics,

    /// Total number of frequency promotions (hits and overwrites)
    pub total_frequency_increments: u64,

    /// Number of distinct frequencies currently in use
    pub active_frequency_levels: u64,

    /// Lowest frequency currently in use (0 when empty)
    pub min_frequency: u64,

    /// Highest frequency currently in use (0 when empty)
    pub max_frequency: u64,

    /// Number of times an insertion crossed the upper bound
    pub bounds_evictions: u64,

    /// Evicted entries delivered to the eviction sink
    pub eviction_notifications: u64,

    /// Evicted entries the eviction sink could not take
    pub eviction_sink_failures: u64,

    /// Entries accepted by the write-back sink
    pub writebacks: u64,

    /// Write-back offers declined or failed
    pub writebacks_declined: u64,
}

impl LfuCacheMetrics {
    /// Creates zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frequency promotion.
    pub fn record_frequency_increment(&mut self) {
        self.total_frequency_increments += 1;
    }

    /// Refreshes the bucket gauges from the current sequence shape.
    pub fn update_frequency_levels(&mut self, levels: usize, min: Option<u64>, max: Option<u64>) {
        self.active_frequency_levels = levels as u64;
        self.min_frequency = min.unwrap_or(0);
        self.max_frequency = max.unwrap_or(0);
    }

    /// Records a hysteresis eviction burst.
    pub fn record_bounds_eviction(&mut self) {
        self.bounds_evictions += 1;
    }

    /// Records the outcome of handing an evicted entry to the eviction sink.
    pub fn record_eviction_notification(&mut self, delivered: bool) {
        if delivered {
            self.eviction_notifications += 1;
        } else {
            self.eviction_sink_failures += 1;
        }
    }

    /// Records the outcome of offering an entry to the write-back sink.
    pub fn record_writeback(&mut self, accepted: bool) {
        if accepted {
            self.writebacks += 1;
        } else {
            self.writebacks_declined += 1;
        }
    }

    /// Frequency promotions per lookup.
    pub fn frequency_increment_rate(&self) -> f64 {
        if self.core.requests > 0 {
            self.total_frequency_increments as f64 / self.core.requests as f64
        } else {
            0.0
        }
    }

    /// Converts LFU metrics to a BTreeMap for reporting
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.core.to_btreemap();

        metrics.insert(
            "active_frequency_levels".to_string(),
            self.active_frequency_levels as f64,
        );
        metrics.insert("min_frequency".to_string(), self.min_frequency as f64);
        metrics.insert("max_frequency".to_string(), self.max_frequency as f64);
        metrics.insert(
            "total_frequency_increments".to_string(),
            self.total_frequency_increments as f64,
        );
        metrics.insert(
            "frequency_increment_rate".to_string(),
            self.frequency_increment_rate(),
        );

        metrics.insert("bounds_evictions".to_string(), self.bounds_evictions as f64);
        metrics.insert(
            "eviction_notifications".to_string(),
            self.eviction_notifications as f64,
        );
        metrics.insert(
            "eviction_sink_failures".to_string(),
            self.eviction_sink_failures as f64,
        );
        metrics.insert("writebacks".to_string(), self.writebacks as f64);
        metrics.insert(
            "writebacks_declined".to_string(),
            self.writebacks_declined as f64,
        );

        metrics
    }
}

impl CacheMetrics for LfuCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn algorithm_name(&self) -> &'static str {
        "LFU"
    }
}
