//! Cache Statistics Module
//!
//! Live counters owned by the store, and the immutable snapshot handed out to
//! callers.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of lookups that found a live value
    pub hit_count: u64,
    /// Number of lookups that found nothing usable
    pub miss_count: u64,
    /// Number of entries removed by capacity pressure or expiry
    pub eviction_count: u64,
    /// Current number of entries in the cache
    pub size: u64,
}

impl CacheStats {
    pub fn new(hit_count: u64, miss_count: u64, eviction_count: u64, size: u64) -> Self {
        Self {
            hit_count,
            miss_count,
            eviction_count,
            size,
        }
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }
}

// == Stats Counters ==
/// Monotonic counters updated by the store.
///
/// Kept outside the store's lock so that `snapshot` never waits on a writer.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    size: AtomicUsize,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        if count > 0 {
            self.evictions.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub(crate) fn set_size(&self, size: usize) {
        self.size.store(size, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
            eviction_count: self.evictions.load(Ordering::Relaxed),
            size: self.size.load(Ordering::Relaxed) as u64,
        }
    }
}
