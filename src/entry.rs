//! Cache Entry Type
//!
//! A `CacheEntry<K, V>` is one cached key/value pair plus the bookkeeping the
//! LFU engine needs to move it between frequency buckets:
//!
//! - `bucket`: handle of the frequency bucket the entry currently belongs to.
//!   This is a non-owning back-reference into the bucket arena; the bucket's
//!   member set refers back to the entry by its own handle.
//! - `persisted`: whether the current value has been handed to the write-back
//!   sink. Cleared every time the value is overwritten.
//!
//! Entries are owned by the entry arena of an [`LfuCache`](crate::LfuCache)
//! and are never exposed by reference outside the cache lock.

use core::fmt;

use crate::arena::SlotId;

/// Handle of an entry in the entry arena.
pub type EntryId = SlotId;

/// Handle of a frequency bucket in the bucket arena.
pub type BucketId = SlotId;

/// One cached key/value pair with its frequency bucket and persistence state.
///
/// # Examples
///
/// ```
/// use lfu_cache_rs::entry::CacheEntry;
///
/// let mut entry = CacheEntry::new("user:42", 7);
/// assert!(!entry.persisted);
/// assert!(entry.bucket.is_none());
///
/// entry.mark_persisted();
/// entry.overwrite(8);
/// assert_eq!(entry.value, 8);
/// assert!(!entry.persisted);
/// ```
pub struct CacheEntry<K, V> {
    /// The cached key
    pub key: K,

    /// The cached value, opaque to the cache
    pub value: V,

    /// Frequency bucket currently holding this entry. `None` only between
    /// creation and the first promotion.
    pub bucket: Option<BucketId>,

    /// Set once the current value was accepted by the write-back sink.
    pub persisted: bool,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates a new, unplaced and unpersisted entry.
    #[inline]
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            bucket: None,
            persisted: false,
        }
    }

    /// Replaces the value and clears the persisted flag, returning the old value.
    #[inline]
    pub fn overwrite(&mut self, value: V) -> V {
        self.persisted = false;
        core::mem::replace(&mut self.value, value)
    }

    /// Records that the current value reached the write-back sink.
    #[inline]
    pub fn mark_persisted(&mut self) {
        self.persisted = true;
    }

    /// Consumes the entry, yielding its key and value.
    #[inline]
    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }
}

impl<K: fmt::Debug, V> fmt::Debug for CacheEntry<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("key", &self.key)
            .field("bucket", &self.bucket)
            .field("persisted", &self.persisted)
            .finish_non_exhaustive()
    }
}
