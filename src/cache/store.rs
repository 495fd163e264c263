//! Cache Store Module
//!
//! Bounded, expiring key-value map combining HashMap storage with LRU tracking
//! and expire-after-write.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tracing::trace;

use crate::cache::stats::StatsCounters;
use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::error::CacheError;

/// Map and recency order, always mutated together under one lock.
#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<String, CacheEntry>,
    lru: LruTracker,
}

impl StoreInner {
    fn remove(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }

    fn purge_expired(&mut self, ttl: Duration) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

// == Cache Store ==
/// Thread-safe store with capacity-based LRU eviction and expire-after-write.
///
/// Individual operations are atomic with respect to the map. Counters live
/// outside the lock, so [`CacheStore::stats`] never waits on a writer.
#[derive(Debug)]
pub struct CacheStore {
    inner: Mutex<StoreInner>,
    counters: StatsCounters,
    max_size: usize,
    expire_after_write: Duration,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store holding at most `max_size` entries (minimum 1), each
    /// living for `expire_after_write` after its last write.
    pub fn new(max_size: usize, expire_after_write: Duration) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            counters: StatsCounters::default(),
            max_size: max_size.max(1),
            expire_after_write,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>, CacheError> {
        self.inner
            .lock()
            .map_err(|_| CacheError::Internal("cache lock poisoned".to_string()))
    }

    // == Get ==
    /// Looks up `key` and returns a clone of the value if it is a live `T`.
    ///
    /// Counts exactly one hit or one miss. An expired entry is removed on the
    /// spot and counted as an eviction. A value of another type is left in
    /// place and reported as [`CacheError::TypeMismatch`].
    pub fn get<T: Any + Clone>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let mut guard = match self.lock() {
            Ok(guard) => guard,
            Err(e) => {
                self.counters.record_miss();
                return Err(e);
            }
        };
        let StoreInner { entries, lru } = &mut *guard;

        let Some(entry) = entries.get(key) else {
            self.counters.record_miss();
            return Ok(None);
        };

        if entry.is_expired(self.expire_after_write) {
            entries.remove(key);
            lru.remove(key);
            self.counters.record_evictions(1);
            self.counters.set_size(entries.len());
            self.counters.record_miss();
            trace!(key, "Expired entry removed on access");
            return Ok(None);
        }

        match entry.downcast_ref::<T>() {
            Some(value) => {
                let value = value.clone();
                lru.touch(key);
                self.counters.record_hit();
                Ok(Some(value))
            }
            None => {
                self.counters.record_miss();
                Err(CacheError::TypeMismatch {
                    key: key.to_string(),
                    expected: type_name::<T>(),
                    found: entry.type_name(),
                })
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous value and resetting
    /// its write time.
    ///
    /// Inserting a new key into a full store first drops expired entries, then
    /// least recently used ones, until there is room.
    pub fn put<T: Any + Send + Sync>(&self, key: &str, value: T) -> Result<(), CacheError> {
        let mut guard = self.lock()?;
        let inner = &mut *guard;

        let mut evicted = 0usize;
        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_size {
            evicted += inner.purge_expired(self.expire_after_write);

            while inner.entries.len() >= self.max_size {
                let Some(victim) = inner.lru.evict_oldest() else {
                    break;
                };
                inner.entries.remove(&victim);
                evicted += 1;
                trace!(key = %victim, "Evicted least recently used entry");
            }
        }

        inner.entries.insert(key.to_string(), CacheEntry::new(value));
        inner.lru.touch(key);

        self.counters.record_evictions(evicted as u64);
        self.counters.set_size(inner.entries.len());
        Ok(())
    }

    // == Remove ==
    /// Removes `key`. Returns whether an entry was present.
    pub fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let mut guard = self.lock()?;
        let removed = guard.remove(key);
        self.counters.set_size(guard.entries.len());
        Ok(removed)
    }

    // == Clear ==
    /// Removes every entry and returns how many there were. Counters are kept.
    pub fn clear(&self) -> Result<usize, CacheError> {
        let mut guard = self.lock()?;
        let count = guard.entries.len();
        guard.entries.clear();
        guard.lru.clear();
        self.counters.set_size(0);
        Ok(count)
    }

    // == Purge Expired ==
    /// Removes all expired entries, counting each as an eviction.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let mut guard = self.lock()?;
        let removed = guard.purge_expired(self.expire_after_write);
        self.counters.record_evictions(removed as u64);
        self.counters.set_size(guard.entries.len());
        Ok(removed)
    }

    // == Stats ==
    /// Returns a snapshot of the live counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Current number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.counters.snapshot().size as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn expire_after_write(&self) -> Duration {
        self.expire_after_write
    }

    /// Poisons the internal lock so failure paths can be exercised.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.inner.lock();
            panic!("poisoning cache store lock");
        }));
    }
}
