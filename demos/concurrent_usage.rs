extern crate lfu_cache_rs;

use lfu_cache_rs::config::LfuCacheConfig;
use lfu_cache_rs::metrics::CacheMetrics;
use lfu_cache_rs::{Eviction, LfuCache};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const NUM_THREADS: usize = 8;
const OPS_PER_THREAD: usize = 20_000;

fn main() {
    println!("Concurrent LFU Cache Usage");
    println!("==========================");
    println!(
        "{} threads share one cache bounded at 1000 entries (evicting down to 500).\n",
        NUM_THREADS
    );

    let (evict_tx, evict_rx) = mpsc::channel::<Eviction<u64, String>>();
    let cache: Arc<LfuCache<u64, String>> = Arc::new(
        LfuCache::init(LfuCacheConfig::new(1000, 500), None).with_eviction_sink(evict_tx),
    );

    // Consumer for eviction notifications
    let drain = thread::spawn(move || evict_rx.iter().count());

    let start = Instant::now();
    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                let mut hits = 0usize;
                for i in 0..OPS_PER_THREAD {
                    // Skewed key space: low keys are requested far more often
                    let key = (i.wrapping_mul(2_654_435_761).wrapping_add(t) % 4096) as u64;
                    let key = key * key % 4096;
                    if cache.get(&key).is_some() {
                        hits += 1;
                    } else {
                        cache.set(key, format!("value-{}", key));
                    }
                }
                hits
            })
        })
        .collect();

    let hits: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    let elapsed = start.elapsed();

    println!(
        "{} operations in {:?} ({} hits)",
        NUM_THREADS * OPS_PER_THREAD,
        elapsed,
        hits
    );
    println!(
        "cache holds {} entries across {} frequency levels",
        cache.len(),
        cache.frequency_levels()
    );

    let metrics = cache.metrics();
    println!("hit rate: {:.2}%", metrics["hit_rate"] * 100.0);
    println!("bounds evictions: {}", metrics["bounds_evictions"]);

    drop(cache);
    println!("eviction notifications received: {}", drain.join().unwrap());
}
