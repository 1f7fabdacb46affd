//! Eviction and Write-Back Notification Sinks
//!
//! The cache hands entries to the outside world through two capabilities:
//!
//! | Sink | Used by | Delivery | On a busy consumer |
//! |------|---------|----------|--------------------|
//! | [`EvictionSink`] | `evict`, bounds eviction in `set` | blocking | caller waits |
//! | [`WriteBackSink`] | `write_back` | non-blocking | entry skipped |
//!
//! Both receive the same payload, an [`Eviction`] holding the key and value.
//! Sinks get owned copies; nothing inside the cache is ever shared with them.
//!
//! Delivery happens while the cache lock is held. A blocking eviction sink
//! whose consumer stops draining will therefore stall every other cache
//! operation until it makes room again.
//!
//! Adapters are provided for `std::sync::mpsc` senders and, with the
//! `crossbeam` feature, for `crossbeam_channel::Sender`.
//!
//! # Examples
//!
//! ```
//! use lfu_cache_rs::sink::{Eviction, SinkError, WriteBackSink};
//! use std::sync::mpsc;
//!
//! let (tx, rx) = mpsc::sync_channel(1);
//! assert_eq!(tx.try_deliver(Eviction::new("a", 1)), Ok(()));
//! assert_eq!(tx.try_deliver(Eviction::new("b", 2)), Err(SinkError::Full));
//! assert_eq!(rx.recv().unwrap(), Eviction::new("a", 1));
//! ```

use std::sync::mpsc;

use thiserror::Error;

/// A key/value pair handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eviction<K, V> {
    /// Key of the cache entry
    pub key: K,
    /// Value of the cache entry at the time of hand-off
    pub value: V,
}

impl<K, V> Eviction<K, V> {
    /// Creates a new notification payload.
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        Self { key, value }
    }
}

impl<K, V> From<(K, V)> for Eviction<K, V> {
    fn from((key, value): (K, V)) -> Self {
        Self { key, value }
    }
}

/// Why a sink did not accept a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink cannot take the notification right now.
    #[error("sink is full")]
    Full,

    /// The consumer behind the sink is gone; nothing will be delivered again.
    #[error("sink is disconnected")]
    Disconnected,
}

/// Blocking receiver of evicted entries.
///
/// `deliver` may block until the consumer has room. It only fails when the
/// consumer can never accept the notification.
pub trait EvictionSink<K, V>: Send {
    /// Hands one evicted entry to the consumer, waiting if necessary.
    fn deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError>;
}

/// Non-blocking receiver of entries to persist.
///
/// `try_deliver` must return immediately. Returning [`SinkError::Full`] tells
/// the cache to leave the entry unpersisted and move on.
pub trait WriteBackSink<K, V>: Send {
    /// Offers one entry to the consumer without waiting.
    fn try_deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError>;
}

impl<K: Send, V: Send> EvictionSink<K, V> for mpsc::Sender<Eviction<K, V>> {
    fn deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError> {
        self.send(eviction).map_err(|_| SinkError::Disconnected)
    }
}

impl<K: Send, V: Send> EvictionSink<K, V> for mpsc::SyncSender<Eviction<K, V>> {
    fn deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError> {
        self.send(eviction).map_err(|_| SinkError::Disconnected)
    }
}

impl<K: Send, V: Send> WriteBackSink<K, V> for mpsc::Sender<Eviction<K, V>> {
    // Unbounded: never full.
    fn try_deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError> {
        self.send(eviction).map_err(|_| SinkError::Disconnected)
    }
}

impl<K: Send, V: Send> WriteBackSink<K, V> for mpsc::SyncSender<Eviction<K, V>> {
    fn try_deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError> {
        self.try_send(eviction).map_err(|err| match err {
            mpsc::TrySendError::Full(_) => SinkError::Full,
            mpsc::TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}

#[cfg(feature = "crossbeam")]
impl<K: Send, V: Send> EvictionSink<K, V> for crossbeam_channel::Sender<Eviction<K, V>> {
    fn deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError> {
        self.send(eviction).map_err(|_| SinkError::Disconnected)
    }
}

#[cfg(feature = "crossbeam")]
impl<K: Send, V: Send> WriteBackSink<K, V> for crossbeam_channel::Sender<Eviction<K, V>> {
    fn try_deliver(&self, eviction: Eviction<K, V>) -> Result<(), SinkError> {
        use crossbeam_channel::TrySendError;

        self.try_send(eviction).map_err(|err| match err {
            TrySendError::Full(_) => SinkError::Full,
            TrySendError::Disconnected(_) => SinkError::Disconnected,
        })
    }
}

/// A sink that accepts and drops every notification.
///
/// Useful for marking entries persisted without an actual store behind them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl<K, V> EvictionSink<K, V> for DiscardSink {
    fn deliver(&self, _eviction: Eviction<K, V>) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<K, V> WriteBackSink<K, V> for DiscardSink {
    fn try_deliver(&self, _eviction: Eviction<K, V>) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_sender_try_deliver_reports_full() {
        let (tx, rx) = mpsc::sync_channel::<Eviction<&str, i32>>(1);
        assert_eq!(tx.try_deliver(Eviction::new("a", 1)), Ok(()));
        assert_eq!(tx.try_deliver(Eviction::new("b", 2)), Err(SinkError::Full));

        assert_eq!(rx.try_recv().unwrap(), Eviction::new("a", 1));
        assert_eq!(tx.try_deliver(Eviction::new("b", 2)), Ok(()));
    }

    #[test]
    fn test_dropped_receiver_reports_disconnected() {
        let (tx, rx) = mpsc::channel::<Eviction<&str, i32>>();
        drop(rx);
        assert_eq!(
            EvictionSink::deliver(&tx, Eviction::new("a", 1)),
            Err(SinkError::Disconnected)
        );
        assert_eq!(
            WriteBackSink::try_deliver(&tx, Eviction::new("a", 1)),
            Err(SinkError::Disconnected)
        );
    }

    #[test]
    fn test_discard_sink_accepts_everything() {
        let sink = DiscardSink;
        for i in 0..10 {
            assert!(EvictionSink::deliver(&sink, Eviction::from((i, i))).is_ok());
            assert!(WriteBackSink::try_deliver(&sink, Eviction::from((i, i))).is_ok());
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(SinkError::Full.to_string(), "sink is full");
        assert_eq!(SinkError::Disconnected.to_string(), "sink is disconnected");
    }

    #[cfg(feature = "crossbeam")]
    #[test]
    fn test_crossbeam_bounded_sender() {
        let (tx, rx) = crossbeam_channel::bounded::<Eviction<u32, u32>>(1);
        assert_eq!(WriteBackSink::try_deliver(&tx, Eviction::new(1, 1)), Ok(()));
        assert_eq!(
            WriteBackSink::try_deliver(&tx, Eviction::new(2, 2)),
            Err(SinkError::Full)
        );
        assert_eq!(rx.recv().unwrap().key, 1);
        assert_eq!(EvictionSink::deliver(&tx, Eviction::new(3, 3)), Ok(()));
    }
}
