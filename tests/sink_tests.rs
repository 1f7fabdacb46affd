//! Notification Sink Tests
//!
//! Exercises the eviction and write-back sinks through the public cache API:
//! which entries get delivered, what the payload contains, and how the cache
//! reacts when a sink is full, slow or gone.

use lfu_cache_rs::config::LfuCacheConfig;
use lfu_cache_rs::metrics::CacheMetrics;
use lfu_cache_rs::{Eviction, EvictionSink, LfuCache, SinkError, WriteBackSink};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

// ============================================================================
// TEST SINKS
// ============================================================================

/// Records every delivery, as a logging sink would.
#[derive(Clone, Default)]
struct RecordingSink {
    seen: Arc<Mutex<Vec<(String, i32)>>>,
}

impl RecordingSink {
    fn keys(&self) -> HashSet<String> {
        self.seen.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }

    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl EvictionSink<String, i32> for RecordingSink {
    fn deliver(&self, eviction: Eviction<String, i32>) -> Result<(), SinkError> {
        self.seen.lock().unwrap().push((eviction.key, eviction.value));
        Ok(())
    }
}

impl WriteBackSink<String, i32> for RecordingSink {
    fn try_deliver(&self, eviction: Eviction<String, i32>) -> Result<(), SinkError> {
        self.seen.lock().unwrap().push((eviction.key, eviction.value));
        Ok(())
    }
}

/// Accepts a fixed number of offers, then reports full.
struct QuotaSink {
    remaining: AtomicUsize,
}

impl QuotaSink {
    fn new(quota: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(quota),
        }
    }
}

impl WriteBackSink<String, i32> for QuotaSink {
    fn try_deliver(&self, _eviction: Eviction<String, i32>) -> Result<(), SinkError> {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|_| ())
            .map_err(|_| SinkError::Full)
    }
}

fn key(i: usize) -> String {
    format!("key{}", i)
}

// ============================================================================
// EVICTION SINK
// ============================================================================

#[test]
fn test_evict_delivers_key_and_value() {
    let (tx, rx) = mpsc::channel::<Eviction<String, i32>>();
    let cache = LfuCache::new().with_eviction_sink(tx);
    cache.set(key(1), 10);
    cache.set(key(2), 20);
    cache.get(&key(2));

    assert_eq!(cache.evict(1), 1);
    assert_eq!(rx.try_recv().unwrap(), Eviction::new(key(1), 10));
    assert!(rx.try_recv().is_err());
}

#[test]
fn test_bounds_eviction_notifies_each_entry() {
    let sink = RecordingSink::default();
    let cache = LfuCache::init(LfuCacheConfig::new(4, 2), None).with_eviction_sink(sink.clone());

    cache.set(key(0), 0);
    cache.set(key(1), 1);
    cache.get(&key(0));
    cache.get(&key(1));
    for i in 2..5 {
        cache.set(key(i), i as i32);
    }

    assert_eq!(cache.len(), 2);
    assert_eq!(sink.count(), 3);
    let expected: HashSet<_> = (2..5).map(key).collect();
    assert_eq!(sink.keys(), expected);
}

#[test]
fn test_delete_and_clear_do_not_notify() {
    let sink = RecordingSink::default();
    let cache = LfuCache::new().with_eviction_sink(sink.clone());
    cache.set(key(1), 1);
    cache.set(key(2), 2);

    cache.delete(&key(1));
    cache.clear();
    assert_eq!(sink.count(), 0);
}

#[test]
fn test_persisted_entries_are_not_redelivered_on_evict() {
    let evicted = RecordingSink::default();
    let persisted = RecordingSink::default();
    let cache = LfuCache::new()
        .with_eviction_sink(evicted.clone())
        .with_writeback_sink(persisted.clone());

    for i in 0..6 {
        cache.set(key(i), i as i32);
    }
    assert_eq!(cache.write_back(6), 6);
    cache.set(key(3), 33);

    assert_eq!(cache.evict(6), 6);
    assert!(cache.is_empty());
    assert_eq!(persisted.count(), 6);
    assert_eq!(*evicted.seen.lock().unwrap(), vec![(key(3), 33)]);
}

#[test]
fn test_disconnected_eviction_sink_still_evicts() {
    let (tx, rx) = mpsc::channel::<Eviction<String, i32>>();
    drop(rx);
    let cache = LfuCache::new().with_eviction_sink(tx);
    cache.set(key(1), 1);
    cache.set(key(2), 2);

    assert_eq!(cache.evict(2), 2);
    assert!(cache.is_empty());
    assert_eq!(cache.metrics()["eviction_sink_failures"], 2.0);
}

#[test]
fn test_clear_eviction_sink_stops_notifications() {
    let sink = RecordingSink::default();
    let cache = LfuCache::new().with_eviction_sink(sink.clone());
    cache.set(key(1), 1);
    cache.evict(1);
    cache.clear_eviction_sink();
    cache.set(key(2), 2);
    cache.evict(1);

    assert_eq!(sink.count(), 1);
}

#[test]
fn test_blocking_eviction_sink_waits_for_consumer() {
    let (tx, rx) = mpsc::sync_channel::<Eviction<String, i32>>(0);
    let cache = Arc::new(LfuCache::new().with_eviction_sink(tx));
    for i in 0..3 {
        cache.set(key(i), i as i32);
    }

    let evictor = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || cache.evict(3))
    };

    // Rendezvous channel: each delivery completes only when received here
    let mut received = HashSet::new();
    for _ in 0..3 {
        let eviction = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        received.insert(eviction.key);
    }

    assert_eq!(evictor.join().unwrap(), 3);
    let expected: HashSet<String> = (0..3).map(key).collect();
    assert_eq!(received, expected);
    assert!(cache.is_empty());
}

// ============================================================================
// WRITE-BACK SINK
// ============================================================================

#[test]
fn test_write_back_payload_is_a_copy() {
    let (tx, rx) = mpsc::sync_channel::<Eviction<String, i32>>(4);
    let cache = LfuCache::new().with_writeback_sink(tx);
    cache.set(key(1), 7);

    assert_eq!(cache.write_back(1), 1);
    assert_eq!(rx.try_recv().unwrap(), Eviction::new(key(1), 7));
    assert_eq!(cache.get(&key(1)), Some(7));
}

#[test]
fn test_write_back_full_channel_skips_without_retry() {
    let (tx, rx) = mpsc::sync_channel::<Eviction<String, i32>>(2);
    let cache = LfuCache::new().with_writeback_sink(tx);
    for i in 0..5 {
        cache.set(key(i), i as i32);
    }

    assert_eq!(cache.write_back(5), 2);
    assert_eq!(rx.try_iter().count(), 2);

    let unpersisted = (0..5)
        .filter(|&i| cache.is_persisted(&key(i)) == Some(false))
        .count();
    assert_eq!(unpersisted, 3);

    // Channel drained: the next pass fills it again and declines the last one
    assert_eq!(cache.write_back(5), 2);
    assert_eq!(cache.metrics()["writebacks_declined"], 4.0);
}

#[test]
fn test_write_back_budget_counts_visits() {
    let cache = LfuCache::new().with_writeback_sink(QuotaSink::new(1));
    for i in 0..4 {
        cache.set(key(i), i as i32);
    }

    // One accepted, one declined: both use the budget
    assert_eq!(cache.write_back(2), 1);
    let persisted = (0..4)
        .filter(|&i| cache.is_persisted(&key(i)) == Some(true))
        .count();
    assert_eq!(persisted, 1);
}

#[test]
fn test_write_back_disconnected_leaves_entries_unpersisted() {
    let (tx, rx) = mpsc::sync_channel::<Eviction<String, i32>>(4);
    drop(rx);
    let cache = LfuCache::new().with_writeback_sink(tx);
    cache.set(key(1), 1);

    assert_eq!(cache.write_back(1), 0);
    assert_eq!(cache.is_persisted(&key(1)), Some(false));
}

#[test]
fn test_write_back_then_evict_scenario() {
    let (wb_tx, wb_rx) = mpsc::sync_channel::<Eviction<String, i32>>(16);
    let (ev_tx, ev_rx) = mpsc::channel::<Eviction<String, i32>>();
    let cache = LfuCache::init(LfuCacheConfig::new(6, 3), None)
        .with_writeback_sink(wb_tx)
        .with_eviction_sink(ev_tx);

    for i in 0..6 {
        cache.set(key(i), i as i32);
        for _ in 0..i {
            cache.get(&key(i));
        }
    }

    // Persist the three coldest
    assert_eq!(cache.write_back(3), 3);
    let persisted: HashSet<String> = wb_rx.try_iter().map(|e| e.key).collect();
    let coldest: HashSet<String> = (0..3).map(key).collect();
    assert_eq!(persisted, coldest);

    // key6 enters at frequency 1; the burst evicts key6 and key0..key2
    cache.set(key(6), 6);
    assert_eq!(cache.len(), 3);
    let notified: Vec<Eviction<String, i32>> = ev_rx.try_iter().collect();
    assert_eq!(notified, vec![Eviction::new(key(6), 6)]);
}

#[cfg(feature = "crossbeam")]
#[test]
fn test_crossbeam_sinks() {
    let (wb_tx, wb_rx) = crossbeam_channel::bounded::<Eviction<String, i32>>(1);
    let (ev_tx, ev_rx) = crossbeam_channel::unbounded::<Eviction<String, i32>>();
    let cache = LfuCache::new()
        .with_writeback_sink(wb_tx)
        .with_eviction_sink(ev_tx);

    cache.set(key(1), 1);
    cache.set(key(2), 2);
    assert_eq!(cache.write_back(2), 1);
    assert_eq!(wb_rx.len(), 1);

    cache.evict(2);
    let notified: Vec<Eviction<String, i32>> = ev_rx.try_iter().collect();
    assert_eq!(notified.len(), 1);
}
