//! Concurrent Cache Correctness Tests
//!
//! Validates that `LfuCache` keeps its invariants and eviction semantics while
//! shared between threads.
//!
//! ## Test Strategy
//!
//! Every operation runs under one cache-wide lock, so these tests check that:
//! - Bounds hold after any interleaving of inserts
//! - Values read back are always values that were written for that key
//! - Every evicted, unpersisted entry is delivered exactly once
//! - Frequency counts add up when many threads hit the same key
//!
//! ## Segments
//!
//! 1. **Thread Safety Invariants**: `std::thread` with `Arc`-shared caches
//! 2. **Scoped Pools**: `scoped_threadpool` borrowing a stack-owned cache

use lfu_cache_rs::config::LfuCacheConfig;
use lfu_cache_rs::metrics::CacheMetrics;
use lfu_cache_rs::{DiscardSink, Eviction, LfuCache};
use scoped_threadpool::Pool;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

const NUM_THREADS: usize = 8;
const OPS_PER_THREAD: usize = 2_000;

// ============================================================================
// SEGMENT 1: THREAD SAFETY INVARIANTS
// ============================================================================

#[test]
fn test_concurrent_bounds_are_respected() {
    let (upper, lower) = (64, 16);
    let cache: Arc<LfuCache<usize, usize>> =
        Arc::new(LfuCache::init(LfuCacheConfig::new(upper, lower), None));
    let mut handles = vec![];

    for t in 0..NUM_THREADS {
        let c = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                c.set(t * OPS_PER_THREAD + i, i);
                assert!(c.len() <= upper, "cache grew past its upper bound");
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let len = cache.len();
    assert!(len >= lower && len <= upper, "unexpected final len {}", len);
}

#[test]
fn test_concurrent_reads_see_written_values() {
    let cache: Arc<LfuCache<usize, usize>> = Arc::new(LfuCache::new());
    for i in 0..100 {
        cache.set(i, i * 100);
    }

    let errors = Arc::new(AtomicUsize::new(0));
    let mut handles = vec![];

    for t in 0..NUM_THREADS {
        let c = Arc::clone(&cache);
        let err = Arc::clone(&errors);
        handles.push(thread::spawn(move || {
            for round in 0..50 {
                for i in 0..100 {
                    if (i + t + round) % 11 == 0 {
                        c.set(i, i * 100);
                    }
                    match c.get(&i) {
                        Some(val) if val == i * 100 => {}
                        _ => {
                            err.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(errors.load(Ordering::Relaxed), 0);
    assert_eq!(cache.len(), 100);
}

#[test]
fn test_concurrent_frequency_counts_every_hit() {
    let cache: Arc<LfuCache<&'static str, u32>> = Arc::new(LfuCache::new());
    cache.set("shared", 0);
    let mut handles = vec![];

    for _ in 0..NUM_THREADS {
        let c = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                assert_eq!(c.get(&"shared"), Some(0));
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.frequency(&"shared"), Some(1 + NUM_THREADS as u64 * 500));
    assert_eq!(cache.metrics()["cache_hits"], (NUM_THREADS * 500) as f64);
}

#[test]
fn test_concurrent_evictions_delivered_exactly_once() {
    let (tx, rx) = mpsc::channel::<Eviction<usize, usize>>();
    let cache: Arc<LfuCache<usize, usize>> = Arc::new(
        LfuCache::init(LfuCacheConfig::new(100, 50), None).with_eviction_sink(tx),
    );
    let mut handles = vec![];

    for t in 0..NUM_THREADS {
        let c = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..OPS_PER_THREAD {
                c.set(t * OPS_PER_THREAD + i, t);
                if i % 97 == 0 {
                    c.evict(3);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let evicted: Vec<usize> = rx.try_iter().map(|e| e.key).collect();
    let unique: HashSet<usize> = evicted.iter().copied().collect();
    assert_eq!(evicted.len(), unique.len(), "an entry was delivered twice");
    assert_eq!(evicted.len() + cache.len(), NUM_THREADS * OPS_PER_THREAD);

    for key in &unique {
        assert!(!cache.contains_key(key));
    }
}

#[test]
fn test_concurrent_write_back_and_evict() {
    let (tx, rx) = mpsc::channel::<Eviction<usize, usize>>();
    let cache: Arc<LfuCache<usize, usize>> = Arc::new(
        LfuCache::new()
            .with_writeback_sink(DiscardSink)
            .with_eviction_sink(tx),
    );
    for i in 0..1_000 {
        cache.set(i, i);
    }

    let writer = {
        let c = Arc::clone(&cache);
        thread::spawn(move || {
            let mut persisted = 0;
            for _ in 0..100 {
                persisted += c.write_back(10);
            }
            persisted
        })
    };
    let evictor = {
        let c = Arc::clone(&cache);
        thread::spawn(move || {
            let mut evicted = 0;
            for _ in 0..100 {
                evicted += c.evict(5);
            }
            evicted
        })
    };

    let persisted = writer.join().unwrap();
    let evicted = evictor.join().unwrap();

    assert_eq!(evicted, 500);
    assert_eq!(cache.len(), 500);
    // Only entries evicted before being written back are delivered
    let notified = rx.try_iter().count();
    assert!(notified <= evicted);
    assert!(persisted + notified >= evicted);
}

// ============================================================================
// SEGMENT 2: SCOPED POOLS
// ============================================================================

#[test]
fn test_scoped_pool_shares_borrowed_cache() {
    let cache: LfuCache<usize, String> = LfuCache::init(LfuCacheConfig::new(256, 128), None);
    let mut pool = Pool::new(4);

    pool.scoped(|scope| {
        for t in 0..4usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..1_000 {
                    let key = (t * 7919 + i * 31) % 512;
                    if i % 3 == 0 {
                        cache.delete(&key);
                    } else {
                        cache.set(key, format!("{}-{}", t, i));
                    }
                    let _ = cache.get(&key);
                }
            });
        }
    });

    assert!(cache.len() <= 256);
    let metrics = cache.metrics();
    assert!(metrics["requests"] >= 4_000.0);
}

#[test]
fn test_scoped_pool_hot_keys_survive_bursts() {
    let cache: LfuCache<usize, usize> = LfuCache::init(LfuCacheConfig::new(32, 16), None);
    for hot in 0..4 {
        cache.set(hot, hot);
        for _ in 0..1_000 {
            cache.get(&hot);
        }
    }

    let mut pool = Pool::new(4);
    pool.scoped(|scope| {
        for t in 0..4usize {
            let cache = &cache;
            scope.execute(move || {
                for i in 0..500 {
                    cache.set(1_000 + t * 500 + i, i);
                }
            });
        }
    });

    for hot in 0..4 {
        assert!(cache.contains_key(&hot), "hot key {} was evicted", hot);
    }
}
