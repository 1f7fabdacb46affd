//! Least Frequently Used Cache Implementation.
//!
//! The LFU cache tracks how often each key is used and, when it has to make
//! room, evicts the entries with the lowest access count first. Every
//! operation is O(1): entries are grouped into frequency buckets (see
//! [`crate::buckets`]) so finding the least used entry, or moving an entry up
//! one access, never requires a search.
//!
//! On top of plain LFU eviction the cache supports:
//!
//! - **Hysteresis bounds**: once an insertion pushes the entry count above
//!   `upper_bound`, entries are evicted in one burst down to `lower_bound`.
//! - **Eviction notification**: each evicted entry that was not already
//!   persisted is handed to a blocking [`EvictionSink`].
//! - **Write-back**: [`LfuCache::write_back`] offers the coldest unpersisted
//!   entries to a non-blocking [`WriteBackSink`] without removing them, and
//!   marks the accepted ones persisted so a later eviction does not deliver
//!   them again.
//!
//! # Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │ LfuCache                                                             │
//! │  Mutex ─▶ LfuSegment                                                 │
//! │            ├─ map:     HashMap<K, EntryId>        (membership, len)  │
//! │            ├─ entries: Arena<CacheEntry<K, V>>    (key, value,       │
//! │            │                                       bucket, persisted)│
//! │            ├─ buckets: FrequencyBuckets           (1) ◄─► (2) ◄─► …  │
//! │            ├─ eviction_sink / writeback_sink                         │
//! │            └─ metrics                                                │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The map, the entry arena and the bucket memberships always describe the
//! same set of entries. All three are only touched by [`LfuSegment`], and the
//! segment is only reachable through the cache's single lock.
//!
//! # Tie-breaking
//!
//! Entries that share a frequency have no defined order. When only part of a
//! bucket is evicted or written back, which of its members are picked is
//! unspecified.

use core::fmt;
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::hash::{BuildHasher, Hash};

use log::{debug, trace, warn};
use parking_lot::Mutex;

#[cfg(feature = "hashbrown")]
use hashbrown::DefaultHashBuilder;
#[cfg(feature = "hashbrown")]
use hashbrown::HashMap;

#[cfg(not(feature = "hashbrown"))]
use std::collections::hash_map::RandomState as DefaultHashBuilder;
#[cfg(not(feature = "hashbrown"))]
use std::collections::HashMap;

use crate::arena::Arena;
use crate::buckets::FrequencyBuckets;
use crate::config::LfuCacheConfig;
use crate::entry::{CacheEntry, EntryId};
use crate::metrics::{CacheMetrics, LfuCacheMetrics};
use crate::sink::{Eviction, EvictionSink, SinkError, WriteBackSink};

/// Internal LFU state: the entry store, the bucket sequence, bounds and sinks.
///
/// Nothing here locks. [`LfuCache`] owns the segment behind a mutex and calls
/// into it with the lock held, which lets `set` run a bounds eviction through
/// [`LfuSegment::evict`] without re-entering the lock.
pub(crate) struct LfuSegment<K, V, S = DefaultHashBuilder> {
    config: LfuCacheConfig,

    /// Key to entry handle. Its length is the cache size.
    map: HashMap<K, EntryId, S>,

    entries: Arena<CacheEntry<K, V>>,

    buckets: FrequencyBuckets,

    eviction_sink: Option<Box<dyn EvictionSink<K, V>>>,

    writeback_sink: Option<Box<dyn WriteBackSink<K, V>>>,

    metrics: LfuCacheMetrics,
}

impl<K: Hash + Eq, V, S: BuildHasher> LfuSegment<K, V, S> {
    /// Creates an empty segment with the given bounds and hash builder.
    pub(crate) fn with_hasher(config: LfuCacheConfig, hash_builder: S) -> Self {
        LfuSegment {
            config,
            map: HashMap::with_hasher(hash_builder),
            entries: Arena::new(),
            buckets: FrequencyBuckets::new(),
            eviction_sink: None,
            writeback_sink: None,
            metrics: LfuCacheMetrics::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub(crate) fn config(&self) -> LfuCacheConfig {
        self.config
    }

    #[inline]
    pub(crate) fn set_config(&mut self, config: LfuCacheConfig) {
        self.config = config;
    }

    #[inline]
    pub(crate) fn set_eviction_sink(&mut self, sink: Option<Box<dyn EvictionSink<K, V>>>) {
        self.eviction_sink = sink;
    }

    #[inline]
    pub(crate) fn set_writeback_sink(&mut self, sink: Option<Box<dyn WriteBackSink<K, V>>>) {
        self.writeback_sink = sink;
    }

    #[inline]
    pub(crate) fn metrics(&self) -> &LfuCacheMetrics {
        &self.metrics
    }

    #[inline]
    pub(crate) fn frequency_levels(&self) -> usize {
        self.buckets.len()
    }

    /// Moves an entry into the next frequency bucket.
    fn promote(&mut self, id: EntryId) {
        let entry = &mut self.entries[id];
        entry.bucket = Some(self.buckets.promote(id, entry.bucket));
    }

    fn refresh_frequency_levels(&mut self) {
        self.metrics.update_frequency_levels(
            self.buckets.len(),
            self.buckets.min_frequency(),
            self.buckets.max_frequency(),
        );
    }

    /// Drops an entry from the arena and its bucket. The caller owns the map.
    fn unlink(&mut self, id: EntryId) -> Option<CacheEntry<K, V>> {
        let entry = self.entries.remove(id)?;
        if let Some(bucket) = entry.bucket {
            self.buckets.remove(bucket, id);
        }
        Some(entry)
    }

    /// Returns the value for `key`, counting the lookup as a use.
    pub(crate) fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let Some(&id) = self.map.get(key) else {
            self.metrics.core.record_miss();
            return None;
        };

        self.metrics.core.record_hit();
        self.metrics.record_frequency_increment();
        self.promote(id);
        self.refresh_frequency_levels();
        Some(&self.entries[id].value)
    }

    /// Stores `value` under `key`.
    ///
    /// Overwriting counts as a use and clears the persisted flag. A new key
    /// starts at frequency 1 and may trigger a bounds eviction.
    pub(crate) fn set(&mut self, key: K, value: V) -> Option<V>
    where
        K: Clone,
    {
        if let Some(&id) = self.map.get(&key) {
            let old = self.entries[id].overwrite(value);
            self.metrics.core.record_update();
            self.metrics.record_frequency_increment();
            self.promote(id);
            self.refresh_frequency_levels();
            return Some(old);
        }

        let id = self.entries.insert(CacheEntry::new(key.clone(), value));
        self.map.insert(key, id);
        self.promote(id);
        self.metrics.core.record_insertion();

        if let Some(excess) = self.config.overflow(self.len()) {
            debug!(
                "lfu: {} entries exceed upper bound {}, evicting {} down to {}",
                self.len(),
                self.config.upper_bound,
                excess,
                self.config.lower_bound
            );
            self.metrics.record_bounds_eviction();
            self.evict(excess);
        }

        self.refresh_frequency_levels();
        None
    }

    /// Removes `key`, returning its value if it was present.
    pub(crate) fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let id = self.map.remove(key)?;
        let entry = self.unlink(id)?;
        self.metrics.core.record_deletion();
        self.refresh_frequency_levels();
        Some(entry.value)
    }

    /// Removes up to `count` entries, lowest frequency first.
    ///
    /// Unpersisted entries are delivered to the eviction sink, blocking until
    /// it accepts them. Returns the number of entries removed.
    pub(crate) fn evict(&mut self, count: usize) -> usize {
        let mut evicted = 0;

        while evicted < count {
            let Some(id) = self.buckets.first_member() else {
                break;
            };
            let Some(entry) = self.unlink(id) else {
                break;
            };
            self.map.remove(&entry.key);
            self.metrics.core.record_eviction();
            evicted += 1;

            if entry.persisted {
                continue;
            }
            if let Some(sink) = &self.eviction_sink {
                let delivered = match sink.deliver(Eviction::from(entry.into_parts())) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!("lfu: eviction notification dropped: {}", err);
                        false
                    }
                };
                self.metrics.record_eviction_notification(delivered);
            }
        }

        if evicted > 0 {
            debug!("lfu: evicted {} of {} requested entries", evicted, count);
        }
        self.refresh_frequency_levels();
        evicted
    }

    /// Offers up to `count` entries, lowest frequency first, to the
    /// write-back sink without removing them.
    ///
    /// Every visited entry uses up one unit of `count`, whether it was
    /// already persisted, accepted, or declined. Returns the number of
    /// entries newly marked persisted.
    pub(crate) fn write_back(&mut self, count: usize) -> usize
    where
        K: Clone,
        V: Clone,
    {
        let Some(sink) = self.writeback_sink.as_deref() else {
            return 0;
        };

        let mut visited = 0;
        let mut persisted = 0;

        'scan: for bucket in self.buckets.iter() {
            for id in bucket.members() {
                if visited == count {
                    break 'scan;
                }
                visited += 1;

                let entry = &mut self.entries[id];
                if entry.persisted {
                    continue;
                }

                match sink.try_deliver(Eviction::new(entry.key.clone(), entry.value.clone())) {
                    Ok(()) => {
                        entry.mark_persisted();
                        persisted += 1;
                        self.metrics.record_writeback(true);
                    }
                    Err(SinkError::Full) => {
                        trace!("lfu: write-back sink full, skipping entry");
                        self.metrics.record_writeback(false);
                    }
                    Err(err) => {
                        warn!("lfu: write-back skipped: {}", err);
                        self.metrics.record_writeback(false);
                    }
                }
            }
        }

        debug!(
            "lfu: write-back visited {} entries, persisted {}",
            visited, persisted
        );
        persisted
    }

    pub(crate) fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.map.contains_key(key)
    }

    pub(crate) fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let &id = self.map.get(key)?;
        let bucket = self.entries[id].bucket?;
        self.buckets.frequency_of(bucket)
    }

    pub(crate) fn is_persisted<Q>(&self, key: &Q) -> Option<bool>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let &id = self.map.get(key)?;
        Some(self.entries[id].persisted)
    }

    /// Drops every entry without notifying any sink.
    pub(crate) fn clear(&mut self) {
        self.map.clear();
        self.entries.clear();
        self.buckets.clear();
        self.refresh_frequency_levels();
    }

    /// Asserts that the map, the arena and the buckets agree.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use crate::buckets::Bucket;

        assert_eq!(self.map.len(), self.entries.len());
        let members: usize = self.buckets.iter().map(Bucket::len).sum();
        assert_eq!(members, self.map.len());

        let mut last = 0;
        for bucket in self.buckets.iter() {
            assert!(bucket.frequency() > last, "buckets out of order");
            assert!(!bucket.is_empty(), "empty bucket left linked");
            last = bucket.frequency();
            for id in bucket.members() {
                let home = self.entries[id].bucket.and_then(|b| self.buckets.frequency_of(b));
                assert_eq!(home, Some(bucket.frequency()));
            }
        }

        for (key, &id) in self.map.iter() {
            assert!(self.entries[id].key == *key, "map points at the wrong entry");
        }
    }
}

impl<K, V, S> fmt::Debug for LfuSegment<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuSegment")
            .field("config", &self.config)
            .field("len", &self.map.len())
            .field("frequency_levels", &self.buckets.len())
            .field("eviction_sink", &self.eviction_sink.is_some())
            .field("writeback_sink", &self.writeback_sink.is_some())
            .finish()
    }
}

/// A thread-safe Least Frequently Used cache with hysteresis bounds and
/// eviction/write-back notification.
///
/// Every method takes `&self` and holds one cache-wide lock for its whole
/// duration, so a cache can be shared between threads behind an `Arc` (or a
/// plain reference in scoped threads). Operations are serialized; there is
/// no internal parallelism.
///
/// # Examples
///
/// ```
/// use lfu_cache_rs::config::LfuCacheConfig;
/// use lfu_cache_rs::LfuCache;
///
/// let cache = LfuCache::init(LfuCacheConfig::new(3, 1), None);
/// cache.set("a", 1);
/// cache.set("b", 2);
/// cache.set("c", 3);
///
/// // "a" is now used three times, "b" and "c" once
/// assert_eq!(cache.get(&"a"), Some(1));
/// assert_eq!(cache.get(&"a"), Some(1));
///
/// // The fourth key crosses the upper bound: evict down to one entry
/// cache.set("d", 4);
/// assert_eq!(cache.len(), 1);
/// assert_eq!(cache.get(&"a"), Some(1));
/// ```
pub struct LfuCache<K, V, S = DefaultHashBuilder> {
    segment: Mutex<LfuSegment<K, V, S>>,
}

impl<K: Hash + Eq, V> LfuCache<K, V, DefaultHashBuilder> {
    /// Creates an empty, unbounded cache with no sinks attached.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfu_cache_rs::LfuCache;
    ///
    /// let cache: LfuCache<String, u32> = LfuCache::new();
    /// assert!(cache.is_empty());
    /// assert!(!cache.config().is_bounded());
    /// ```
    pub fn new() -> Self {
        Self::init(LfuCacheConfig::default(), None)
    }

    /// Creates an empty cache with the given bounds and an optional hasher.
    pub fn init(config: LfuCacheConfig, hasher: Option<DefaultHashBuilder>) -> Self {
        Self::init_with_hasher(config, hasher.unwrap_or_default())
    }
}

impl<K: Hash + Eq, V> Default for LfuCache<K, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> LfuCache<K, V, S> {
    /// Creates an empty cache with the given bounds and hash builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfu_cache_rs::config::LfuCacheConfig;
    /// use lfu_cache_rs::LfuCache;
    /// use std::collections::hash_map::RandomState;
    ///
    /// let cache: LfuCache<&str, u32, _> =
    ///     LfuCache::init_with_hasher(LfuCacheConfig::default(), RandomState::new());
    /// cache.set("k", 1);
    /// assert_eq!(cache.get(&"k"), Some(1));
    /// ```
    pub fn init_with_hasher(config: LfuCacheConfig, hash_builder: S) -> Self {
        Self {
            segment: Mutex::new(LfuSegment::with_hasher(config, hash_builder)),
        }
    }

    /// Attaches a blocking eviction sink, builder style.
    pub fn with_eviction_sink<T>(self, sink: T) -> Self
    where
        T: EvictionSink<K, V> + 'static,
    {
        self.set_eviction_sink(sink);
        self
    }

    /// Attaches a non-blocking write-back sink, builder style.
    pub fn with_writeback_sink<T>(self, sink: T) -> Self
    where
        T: WriteBackSink<K, V> + 'static,
    {
        self.set_writeback_sink(sink);
        self
    }

    /// Replaces the eviction sink.
    pub fn set_eviction_sink<T>(&self, sink: T)
    where
        T: EvictionSink<K, V> + 'static,
    {
        self.segment.lock().set_eviction_sink(Some(Box::new(sink)));
    }

    /// Replaces the write-back sink.
    pub fn set_writeback_sink<T>(&self, sink: T)
    where
        T: WriteBackSink<K, V> + 'static,
    {
        self.segment.lock().set_writeback_sink(Some(Box::new(sink)));
    }

    /// Detaches the eviction sink; evictions stop notifying anyone.
    pub fn clear_eviction_sink(&self) {
        self.segment.lock().set_eviction_sink(None);
    }

    /// Detaches the write-back sink; `write_back` becomes a no-op.
    pub fn clear_writeback_sink(&self) {
        self.segment.lock().set_writeback_sink(None);
    }

    /// Returns the current bounds.
    pub fn config(&self) -> LfuCacheConfig {
        self.segment.lock().config()
    }

    /// Changes the bounds. Takes effect on the next insertion of a new key.
    pub fn set_bounds(&self, upper_bound: usize, lower_bound: usize) {
        self.segment
            .lock()
            .set_config(LfuCacheConfig::new(upper_bound, lower_bound));
    }

    /// Returns the number of entries in the cache.
    pub fn len(&self) -> usize {
        self.segment.lock().len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.segment.lock().is_empty()
    }

    /// Returns a clone of the value for `key`.
    ///
    /// A hit counts as a use and moves the entry up one frequency.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.segment.lock().get(key).cloned()
    }

    /// Applies `f` to the value for `key` while holding the lock.
    ///
    /// Same frequency effect as [`get`](Self::get), without cloning the value.
    pub fn get_with<Q, F, R>(&self, key: &Q, f: F) -> Option<R>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        F: FnOnce(&V) -> R,
    {
        self.segment.lock().get(key).map(f)
    }

    /// Stores `value` under `key`.
    ///
    /// Overwriting an existing key replaces the value, clears its persisted
    /// flag and counts as a use. Inserting a new key may push the cache past
    /// `upper_bound`, in which case the least frequently used entries are
    /// evicted (and delivered to the eviction sink) until `lower_bound`
    /// entries remain. That eviction happens inside this call.
    pub fn set(&self, key: K, value: V)
    where
        K: Clone,
    {
        self.segment.lock().set(key, value);
    }

    /// Removes `key`, returning its value. Missing keys are ignored.
    ///
    /// Deleted entries are not delivered to any sink.
    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().delete(key)
    }

    /// Removes up to `count` entries, least frequently used first.
    ///
    /// Each removed entry that is not persisted is delivered to the eviction
    /// sink, if one is attached. Delivery blocks until the sink accepts it.
    /// Returns the number of entries removed, which is less than `count`
    /// when the cache runs out of entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfu_cache_rs::{Eviction, LfuCache};
    /// use std::sync::mpsc;
    ///
    /// let (tx, rx) = mpsc::channel::<Eviction<&str, i32>>();
    /// let cache: LfuCache<&str, i32> = LfuCache::new().with_eviction_sink(tx);
    /// cache.set("cold", 1);
    /// cache.set("hot", 2);
    /// cache.get(&"hot");
    ///
    /// assert_eq!(cache.evict(1), 1);
    /// assert_eq!(rx.recv().unwrap().key, "cold");
    /// assert_eq!(cache.evict(5), 1);
    /// assert_eq!(cache.evict(5), 0);
    /// ```
    pub fn evict(&self, count: usize) -> usize {
        self.segment.lock().evict(count)
    }

    /// Offers up to `count` of the least frequently used entries to the
    /// write-back sink, without removing them.
    ///
    /// Entries the sink accepts are marked persisted and will not be
    /// delivered to the eviction sink when evicted, unless overwritten in the
    /// meantime. Entries the sink declines are skipped without retry. Already
    /// persisted entries are skipped too but still use up their share of
    /// `count`. Returns the number of entries newly persisted.
    ///
    /// # Examples
    ///
    /// ```
    /// use lfu_cache_rs::{Eviction, LfuCache};
    /// use std::sync::mpsc;
    ///
    /// let (tx, rx) = mpsc::sync_channel::<Eviction<&str, i32>>(8);
    /// let cache: LfuCache<&str, i32> = LfuCache::new().with_writeback_sink(tx);
    /// cache.set("a", 1);
    ///
    /// assert_eq!(cache.write_back(10), 1);
    /// assert_eq!(cache.is_persisted(&"a"), Some(true));
    /// assert_eq!(rx.try_recv().unwrap().value, 1);
    ///
    /// // Nothing left to persist
    /// assert_eq!(cache.write_back(10), 0);
    /// assert_eq!(cache.len(), 1);
    /// ```
    pub fn write_back(&self, count: usize) -> usize
    where
        K: Clone,
        V: Clone,
    {
        self.segment.lock().write_back(count)
    }

    /// Returns `true` if `key` is cached. Does not count as a use.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().contains_key(key)
    }

    /// Returns the access frequency of `key`. Does not count as a use.
    pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().frequency(key)
    }

    /// Returns whether the current value of `key` has been written back.
    pub fn is_persisted<Q>(&self, key: &Q) -> Option<bool>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.segment.lock().is_persisted(key)
    }

    /// Number of distinct access frequencies currently in use.
    pub fn frequency_levels(&self) -> usize {
        self.segment.lock().frequency_levels()
    }

    /// Removes every entry. No sink is notified.
    pub fn clear(&self) {
        self.segment.lock().clear();
    }

    /// Returns a copy of the cache's metrics counters.
    pub fn metrics_snapshot(&self) -> LfuCacheMetrics {
        self.segment.lock().metrics().clone()
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> CacheMetrics for LfuCache<K, V, S> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.segment.lock().metrics().metrics()
    }

    fn algorithm_name(&self) -> &'static str {
        "LFU"
    }
}

impl<K, V, S> fmt::Debug for LfuCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.segment.try_lock() {
            Some(segment) => f.debug_struct("LfuCache").field("segment", &*segment).finish(),
            None => f.debug_struct("LfuCache").field("segment", &"<locked>").finish(),
        }
    }
}
