//! Frequency Bucket Sequence
//!
//! The core of the O(1) LFU engine: an ascending, doubly linked sequence of
//! buckets, one per access count currently in use. Each bucket holds the set
//! of entries sitting at exactly that count.
//!
//! ```text
//!   head                                                     tail
//!    │                                                        │
//!    ▼                                                        ▼
//!  ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//!  │ freq = 1     │ ◄──► │ freq = 3     │ ◄──► │ freq = 7     │
//!  │ {e2, e5, e9} │      │ {e1}         │      │ {e4, e6}     │
//!  └──────────────┘      └──────────────┘      └──────────────┘
//! ```
//!
//! Invariants maintained by every operation:
//!
//! - frequencies strictly increase from head to tail (no duplicates)
//! - no bucket is ever empty; a bucket is freed as soon as its last member leaves
//! - an entry is a member of at most one bucket
//!
//! Buckets live in an [`Arena`] and link to their neighbours by [`BucketId`],
//! so splicing in a new bucket or freeing an emptied one touches only the
//! adjacent handles.
//!
//! Promotion only ever needs the bucket immediately after the entry's current
//! one (or the head, for a brand-new entry): if that neighbour already has
//! frequency `f + 1` it is reused, otherwise a new bucket is spliced in right
//! there. No search, no sorting.
//!
//! Members of a bucket are kept in a hash set. Iteration order within a
//! bucket is unspecified, so callers draining a bucket must not assume any
//! secondary (insertion or recency) order among entries of equal frequency.

use core::fmt;
use core::ops::Index;

#[cfg(feature = "hashbrown")]
use hashbrown::HashSet;

#[cfg(not(feature = "hashbrown"))]
use std::collections::HashSet;

use crate::arena::Arena;
use crate::entry::{BucketId, EntryId};

/// The set of entries sharing one access frequency.
pub struct Bucket {
    frequency: u64,
    members: HashSet<EntryId>,
    prev: Option<BucketId>,
    next: Option<BucketId>,
}

impl Bucket {
    fn new(frequency: u64, prev: Option<BucketId>, next: Option<BucketId>) -> Self {
        Self {
            frequency,
            members: HashSet::new(),
            prev,
            next,
        }
    }

    /// Access count shared by every member.
    #[inline]
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Number of entries in this bucket. Never zero for a linked bucket.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Always `false` for a bucket reachable from the sequence.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns `true` if `entry` sits in this bucket.
    #[inline]
    pub fn contains(&self, entry: EntryId) -> bool {
        self.members.contains(&entry)
    }

    /// Members in unspecified order.
    pub fn members(&self) -> impl Iterator<Item = EntryId> + '_ {
        self.members.iter().copied()
    }

    /// Any one member; which one is unspecified.
    #[inline]
    pub fn any_member(&self) -> Option<EntryId> {
        self.members.iter().next().copied()
    }

    /// The next higher-frequency bucket.
    #[inline]
    pub fn next(&self) -> Option<BucketId> {
        self.next
    }

    /// The next lower-frequency bucket.
    #[inline]
    pub fn prev(&self) -> Option<BucketId> {
        self.prev
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("frequency", &self.frequency)
            .field("len", &self.members.len())
            .finish()
    }
}

/// Ascending sequence of frequency buckets with O(1) promote and remove.
///
/// # Examples
///
/// ```
/// use lfu_cache_rs::arena::Arena;
/// use lfu_cache_rs::buckets::FrequencyBuckets;
///
/// // Entry handles normally come from the cache's entry arena.
/// let mut entries = Arena::new();
/// let a = entries.insert("a");
/// let b = entries.insert("b");
///
/// let mut buckets = FrequencyBuckets::new();
/// let a_bucket = buckets.promote(a, None); // a at frequency 1
/// let b_bucket = buckets.promote(b, None); // b at frequency 1
/// assert_eq!(a_bucket, b_bucket);
///
/// let a_bucket = buckets.promote(a, Some(a_bucket)); // a at frequency 2
/// assert_eq!(buckets.frequency_of(a_bucket), Some(2));
/// assert_eq!(buckets.len(), 2);
///
/// // b is now the only least-frequently-used entry
/// assert_eq!(buckets.first_member(), Some(b));
/// ```
pub struct FrequencyBuckets {
    arena: Arena<Bucket>,
    head: Option<BucketId>,
    tail: Option<BucketId>,
}

impl FrequencyBuckets {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            head: None,
            tail: None,
        }
    }

    /// Number of buckets (distinct frequencies) currently in use.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if no entry is tracked.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Lowest-frequency bucket.
    #[inline]
    pub fn front(&self) -> Option<BucketId> {
        self.head
    }

    /// Highest-frequency bucket.
    #[inline]
    pub fn back(&self) -> Option<BucketId> {
        self.tail
    }

    /// Returns the bucket behind `id`, if it is still live.
    #[inline]
    pub fn get(&self, id: BucketId) -> Option<&Bucket> {
        self.arena.get(id)
    }

    /// Frequency of bucket `id`, if it is still live.
    #[inline]
    pub fn frequency_of(&self, id: BucketId) -> Option<u64> {
        self.arena.get(id).map(Bucket::frequency)
    }

    /// Smallest frequency in use.
    #[inline]
    pub fn min_frequency(&self) -> Option<u64> {
        self.head.map(|id| self.arena[id].frequency)
    }

    /// Largest frequency in use.
    #[inline]
    pub fn max_frequency(&self) -> Option<u64> {
        self.tail.map(|id| self.arena[id].frequency)
    }

    /// Some member of the lowest-frequency bucket: the next eviction victim.
    #[inline]
    pub fn first_member(&self) -> Option<EntryId> {
        self.head.and_then(|id| self.arena[id].any_member())
    }

    /// Moves `entry` up by one access.
    ///
    /// `current` is the bucket the entry sits in now, or `None` for an entry
    /// that is not tracked yet (it lands at frequency 1). The entry is added
    /// to the bucket for `current + 1`, creating and splicing that bucket in
    /// directly after `current` (or at the head) if its neighbour does not
    /// already carry that frequency, and is then dropped from `current`,
    /// which is freed if it became empty.
    ///
    /// Returns the entry's new bucket.
    pub fn promote(&mut self, entry: EntryId, current: Option<BucketId>) -> BucketId {
        let (next_frequency, neighbour) = match current {
            Some(id) => {
                let bucket = &self.arena[id];
                (bucket.frequency + 1, bucket.next)
            }
            None => (1, self.head),
        };

        let target = match neighbour {
            Some(id) if self.arena[id].frequency == next_frequency => id,
            _ => self.insert_after(current, next_frequency),
        };

        self.arena[target].members.insert(entry);
        if let Some(id) = current {
            self.remove(id, entry);
        }
        target
    }

    /// Drops `entry` from `bucket`, freeing the bucket if it is now empty.
    ///
    /// Returns `false` if the bucket is stale or did not hold the entry.
    pub fn remove(&mut self, bucket: BucketId, entry: EntryId) -> bool {
        let Some(slot) = self.arena.get_mut(bucket) else {
            return false;
        };
        if !slot.members.remove(&entry) {
            return false;
        }
        if slot.members.is_empty() {
            self.unlink(bucket);
        }
        true
    }

    /// Iterates over buckets from lowest to highest frequency.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            buckets: self,
            cursor: self.head,
        }
    }

    /// Drops every bucket.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.head = None;
        self.tail = None;
    }

    fn insert_after(&mut self, prev: Option<BucketId>, frequency: u64) -> BucketId {
        let next = match prev {
            Some(id) => self.arena[id].next,
            None => self.head,
        };

        let id = self.arena.insert(Bucket::new(frequency, prev, next));

        match prev {
            Some(p) => self.arena[p].next = Some(id),
            None => self.head = Some(id),
        }
        match next {
            Some(n) => self.arena[n].prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }

    fn unlink(&mut self, id: BucketId) {
        let Some(bucket) = self.arena.remove(id) else {
            return;
        };

        match bucket.prev {
            Some(p) => self.arena[p].next = bucket.next,
            None => self.head = bucket.next,
        }
        match bucket.next {
            Some(n) => self.arena[n].prev = bucket.prev,
            None => self.tail = bucket.prev,
        }
    }
}

impl Default for FrequencyBuckets {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<BucketId> for FrequencyBuckets {
    type Output = Bucket;

    #[track_caller]
    fn index(&self, id: BucketId) -> &Bucket {
        &self.arena[id]
    }
}

impl fmt::Debug for FrequencyBuckets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Ascending iterator over the buckets of a [`FrequencyBuckets`].
#[derive(Debug)]
pub struct Iter<'a> {
    buckets: &'a FrequencyBuckets,
    cursor: Option<BucketId>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Bucket;

    fn next(&mut self) -> Option<&'a Bucket> {
        let buckets = self.buckets;
        let bucket = &buckets.arena[self.cursor?];
        self.cursor = bucket.next;
        Some(bucket)
    }
}
