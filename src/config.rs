//! Cache Configuration
//!
//! Bounds configuration for the [`LfuCache`](crate::LfuCache).
//!
//! The cache is unbounded by default. Setting both `upper_bound` and
//! `lower_bound` to non-zero values enables hysteresis eviction: as soon as an
//! insertion pushes the entry count above `upper_bound`, the least frequently
//! used entries are evicted in one burst until exactly `lower_bound` remain.
//!
//! ```text
//!  len
//!   ▲
//! U ┤      ╱│      ╱│
//!   │     ╱ │     ╱ │
//!   │    ╱  │    ╱  │
//! L ┤   ╱   └───╱   └──
//!   │  ╱
//!   └──────────────────────▶ inserts
//! ```
//!
//! If either bound is 0 the behaviour is disabled. Bounds are not validated:
//! `lower_bound >= upper_bound` is accepted and simply changes how much each
//! burst removes.
//!
//! # Examples
//!
//! ```
//! use lfu_cache_rs::config::LfuCacheConfig;
//! use lfu_cache_rs::LfuCache;
//!
//! // Evict down to 800 entries whenever the cache grows past 1000
//! let config = LfuCacheConfig {
//!     upper_bound: 1000,
//!     lower_bound: 800,
//! };
//! let cache: LfuCache<String, Vec<u8>> = LfuCache::init(config, None);
//! assert!(cache.config().is_bounded());
//! ```

use core::fmt;

/// Configuration for an LFU cache.
///
/// # Fields
///
/// - `upper_bound`: entry count that triggers a bounds eviction when exceeded (0 = disabled)
/// - `lower_bound`: entry count left after a bounds eviction (0 = disabled)
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct LfuCacheConfig {
    /// Entry count above which an insertion triggers eviction.
    pub upper_bound: usize,
    /// Entry count the cache is evicted down to once `upper_bound` is exceeded.
    pub lower_bound: usize,
}

impl LfuCacheConfig {
    /// A configuration with both bounds disabled.
    pub const UNBOUNDED: Self = Self {
        upper_bound: 0,
        lower_bound: 0,
    };

    /// Creates a configuration with the given bounds.
    #[must_use]
    pub const fn new(upper_bound: usize, lower_bound: usize) -> Self {
        Self {
            upper_bound,
            lower_bound,
        }
    }

    /// Returns `true` when both bounds are set and hysteresis eviction is active.
    #[inline]
    pub const fn is_bounded(&self) -> bool {
        self.upper_bound > 0 && self.lower_bound > 0
    }

    /// Number of entries to evict for a cache holding `len` entries, if any.
    ///
    /// Returns `None` when the bounds are disabled or `len` does not exceed
    /// `upper_bound`.
    #[inline]
    pub fn overflow(&self, len: usize) -> Option<usize> {
        if self.is_bounded() && len > self.upper_bound {
            Some(len.saturating_sub(self.lower_bound))
        } else {
            None
        }
    }
}

impl fmt::Debug for LfuCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LfuCacheConfig")
            .field("upper_bound", &self.upper_bound)
            .field("lower_bound", &self.lower_bound)
            .finish()
    }
}
