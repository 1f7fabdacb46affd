extern crate lfu_cache_rs;

use lfu_cache_rs::config::LfuCacheConfig;
use lfu_cache_rs::metrics::CacheMetrics;
use lfu_cache_rs::{Eviction, LfuCache};
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;

fn main() {
    println!("LFU Cache Write-Back Demo");
    println!("=========================");
    println!("A cache of user sessions in front of a slow store.");
    println!("Cold sessions are written back in the background; evictions only");
    println!("reach the store for sessions that were never written back.\n");

    // The store drains both channels on its own thread
    let (persist_tx, persist_rx) = mpsc::sync_channel::<Eviction<String, u32>>(4);
    let (evict_tx, evict_rx) = mpsc::channel::<Eviction<String, u32>>();

    let store = thread::spawn(move || {
        let mut table = HashMap::new();
        let mut writes = 0;
        for eviction in persist_rx.iter() {
            table.insert(eviction.key, eviction.value);
            writes += 1;
        }
        for eviction in evict_rx.iter() {
            println!("  store <- evicted {} = {}", eviction.key, eviction.value);
            table.insert(eviction.key, eviction.value);
            writes += 1;
        }
        (table, writes)
    });

    let config = LfuCacheConfig {
        upper_bound: 8,
        lower_bound: 4,
    };
    let cache = LfuCache::init(config, None)
        .with_writeback_sink(persist_tx)
        .with_eviction_sink(evict_tx);

    for user in 0..8u32 {
        cache.set(format!("session:{}", user), user * 10);
    }

    // Sessions 0..3 are popular
    for _ in 0..5 {
        for user in 0..3u32 {
            cache.get(&format!("session:{}", user));
        }
    }

    let persisted = cache.write_back(6);
    println!("write_back(6) persisted {} of the 6 coldest sessions", persisted);
    for user in 0..8u32 {
        let key = format!("session:{}", user);
        println!(
            "  {:<10} freq={} persisted={}",
            key,
            cache.frequency(&key).unwrap_or(0),
            cache.is_persisted(&key).unwrap_or(false)
        );
    }

    println!("\nInserting session:8 crosses the upper bound of 8:");
    cache.set("session:8".to_string(), 80);
    println!("cache now holds {} sessions", cache.len());

    println!("\nMetrics:");
    for (name, value) in cache.metrics() {
        println!("  {:<28} {}", name, value);
    }

    // Dropping the cache closes both channels so the store thread finishes
    drop(cache);
    let (table, writes) = store.join().unwrap();
    println!("\nstore received {} writes for {} sessions", writes, table.len());
}
