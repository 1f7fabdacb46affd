#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Operations
//!
//! | Operation | Effect on frequency | Notifies | Complexity |
//! |-----------|---------------------|----------|------------|
//! | [`LfuCache::get`] | +1 on hit | - | O(1) |
//! | [`LfuCache::set`] | new key at 1, overwrite +1 | eviction sink (bounds) | O(1) amortized |
//! | [`LfuCache::delete`] | removed | - | O(1) |
//! | [`LfuCache::evict`] | removed, lowest first | eviction sink | O(count) |
//! | [`LfuCache::write_back`] | unchanged | write-back sink | O(count) |
//! | [`LfuCache::len`] | unchanged | - | O(1) |
//!
//! ## Bounded Cache with Eviction Notification
//!
//! ```rust
//! use lfu_cache_rs::config::LfuCacheConfig;
//! use lfu_cache_rs::{Eviction, LfuCache};
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::channel::<Eviction<&str, i32>>();
//! let cache = LfuCache::init(LfuCacheConfig::new(3, 1), None).with_eviction_sink(tx);
//!
//! cache.set("a", 1);
//! cache.set("b", 2);
//! cache.set("c", 3);
//! cache.get(&"a");
//!
//! // Crossing the upper bound evicts everything but the hottest entry
//! cache.set("d", 4);
//! assert_eq!(cache.len(), 1);
//!
//! let mut evicted: Vec<_> = rx.try_iter().map(|e| e.key).collect();
//! evicted.sort();
//! assert_eq!(evicted, vec!["b", "c", "d"]);
//! ```
//!
//! ## Write-Back
//!
//! ```rust
//! use lfu_cache_rs::{Eviction, LfuCache};
//! use std::sync::mpsc;
//!
//! let (persist_tx, persist_rx) = mpsc::sync_channel::<Eviction<u32, String>>(16);
//! let (evict_tx, evict_rx) = mpsc::channel::<Eviction<u32, String>>();
//! let cache: LfuCache<u32, String> = LfuCache::new()
//!     .with_writeback_sink(persist_tx)
//!     .with_eviction_sink(evict_tx);
//!
//! cache.set(1, "one".to_string());
//! assert_eq!(cache.write_back(1), 1);
//! assert_eq!(persist_rx.try_recv().unwrap().value, "one");
//!
//! // Already persisted, so eviction stays silent
//! assert_eq!(cache.evict(1), 1);
//! assert!(evict_rx.try_recv().is_err());
//! ```
//!
//! ## Modules
//!
//! - [`lfu`]: the cache itself
//! - [`config`]: hysteresis bounds
//! - [`sink`]: eviction and write-back sinks
//! - [`buckets`]: the ordered frequency-bucket sequence
//! - [`arena`]: generational slot storage backing entries and buckets
//! - [`entry`]: per-key record
//! - [`metrics`]: counters reported through [`metrics::CacheMetrics`]

/// Generational slot storage.
///
/// Entries and buckets live in arenas and refer to each other through
/// copyable handles instead of pointers. A handle to a removed slot is
/// detected rather than silently aliasing whatever reuses the slot.
pub mod arena;

/// Per-key cache record.
///
/// Holds the key, the value, the handle of the frequency bucket the entry
/// belongs to, and whether the current value has been written back.
pub mod entry;

/// Frequency buckets.
///
/// An ordered, doubly linked sequence of buckets, one per distinct access
/// frequency currently in use, strictly ascending from front to back.
pub mod buckets;

/// Cache configuration structures.
pub mod config;

/// Eviction and write-back notification sinks.
///
/// Adapters are provided for `std::sync::mpsc` senders, and for
/// `crossbeam_channel::Sender` when the `crossbeam` feature is enabled.
pub mod sink;

/// Least Frequently Used (LFU) cache implementation.
///
/// A thread-safe cache that evicts the least frequently used entries, with
/// hysteresis bounds and eviction/write-back notification.
pub mod lfu;

/// Cache metrics system.
///
/// Counters updated by every cache operation, reported through the
/// [`metrics::CacheMetrics`] trait.
pub mod metrics;

// Re-export cache types
pub use config::LfuCacheConfig;
pub use lfu::LfuCache;

// Re-export entry type
pub use entry::CacheEntry;

// Re-export sink types
pub use sink::{DiscardSink, Eviction, EvictionSink, SinkError, WriteBackSink};
