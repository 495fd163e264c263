//! Cache Service Module
//!
//! Cache-aside facade in front of [`CacheStore`]. Callers look up a key, and on
//! a miss compute the value themselves and hand it back for storage.
//!
//! Every store failure is absorbed here: logged, counted under `cache.errors`,
//! and turned into a miss or a no-op. Nothing escapes to the caller.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, trace, warn};

use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::metrics::{names, MetricsRecorder};

// == Cache Service ==
/// Shared cache-aside cache.
///
/// When constructed disabled there is no store at all: lookups miss without
/// being counted, writes are dropped, and `get_or_compute` always calls the
/// supplier.
///
/// `get_or_compute` is not a critical section. Two callers missing on the
/// same key at the same time will both run their supplier and both write;
/// the last write wins.
pub struct CacheService {
    store: Option<CacheStore>,
    metrics: Arc<dyn MetricsRecorder>,
}

impl CacheService {
    // == Constructors ==
    pub fn new(
        enabled: bool,
        max_size: usize,
        expire_after_write: Duration,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> Self {
        let store = if enabled {
            info!(
                max_size,
                expire_after_write_secs = expire_after_write.as_secs(),
                "Cache initialized"
            );
            Some(CacheStore::new(max_size, expire_after_write))
        } else {
            info!("Cache disabled");
            None
        };

        Self { store, metrics }
    }

    /// Builds the cache from the `cache` settings in `config`.
    pub fn from_config(config: &Config, metrics: Arc<dyn MetricsRecorder>) -> Self {
        Self::new(
            config.cache_enabled,
            config.cache_max_size,
            config.expire_after_write(),
            metrics,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    // == Get ==
    /// Returns the cached value for `key` if present, live, and of type `T`.
    pub fn get<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone + Send + Sync,
    {
        let store = self.store.as_ref()?;

        match store.get::<T>(key) {
            Ok(Some(value)) => {
                self.metrics.increment_counter(names::CACHE_HITS);
                trace!(key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                self.metrics.increment_counter(names::CACHE_MISSES);
                trace!(key, "Cache miss");
                None
            }
            Err(e) => {
                // The store has already counted this lookup as a miss
                warn!(key, error = %e, "Cache get operation failed");
                self.metrics.increment_counter(names::CACHE_MISSES);
                self.metrics.increment_counter(names::CACHE_ERRORS);
                None
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous value.
    pub fn put<T>(&self, key: &str, value: T)
    where
        T: Any + Send + Sync,
    {
        let Some(store) = &self.store else {
            return;
        };

        match store.put(key, value) {
            Ok(()) => trace!(key, "Cached value"),
            Err(e) => {
                warn!(key, error = %e, "Cache put operation failed");
                self.metrics.increment_counter(names::CACHE_ERRORS);
            }
        }
    }

    // == Get Or Compute ==
    /// Returns the cached value, or runs `supplier` on the calling thread and
    /// caches its `Ok` result.
    ///
    /// On a hit the supplier is never invoked. An `Err` from the supplier is
    /// returned as-is and nothing is cached.
    pub fn get_or_compute<T, E, F>(&self, key: &str, supplier: F) -> Result<T, E>
    where
        T: Any + Clone + Send + Sync,
        F: FnOnce() -> Result<T, E>,
    {
        if !self.is_enabled() {
            return supplier();
        }

        let started = Instant::now();
        let result = match self.get::<T>(key) {
            Some(cached) => Ok(cached),
            None => supplier().map(|computed| {
                self.put(key, computed.clone());
                computed
            }),
        };
        self.record_duration(started, result.is_ok());
        result
    }

    // == Get Or Compute Async ==
    /// Asynchronous variant of [`CacheService::get_or_compute`].
    ///
    /// A hit resolves without awaiting anything. On a miss the future produced
    /// by `supplier` is awaited and its `Ok` value cached.
    pub async fn get_or_compute_async<T, E, F, Fut>(&self, key: &str, supplier: F) -> Result<T, E>
    where
        T: Any + Clone + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.is_enabled() {
            return supplier().await;
        }

        if let Some(cached) = self.get::<T>(key) {
            return Ok(cached);
        }

        let started = Instant::now();
        let result = supplier().await.map(|computed| {
            self.put(key, computed.clone());
            computed
        });
        self.record_duration(started, result.is_ok());
        result
    }

    // == Evict ==
    /// Removes `key` if present. Safe to call repeatedly.
    pub fn evict(&self, key: &str) {
        let Some(store) = &self.store else {
            return;
        };

        match store.remove(key) {
            Ok(removed) => trace!(key, removed, "Evicted cache entry"),
            Err(e) => {
                warn!(key, error = %e, "Cache eviction failed");
                self.metrics.increment_counter(names::CACHE_ERRORS);
            }
        }
    }

    // == Evict All ==
    /// Removes every entry. Hit, miss and eviction counters are not reset.
    pub fn evict_all(&self) {
        let Some(store) = &self.store else {
            return;
        };

        match store.clear() {
            Ok(count) => info!(count, "Evicted all cache entries"),
            Err(e) => {
                warn!(error = %e, "Cache clear operation failed");
                self.metrics.increment_counter(names::CACHE_ERRORS);
            }
        }
    }

    // == Purge Expired ==
    /// Drops entries whose expire-after-write has elapsed. Returns how many.
    pub fn purge_expired(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };

        store.purge_expired().unwrap_or_else(|e| {
            warn!(error = %e, "Cache purge failed");
            self.metrics.increment_counter(names::CACHE_ERRORS);
            0
        })
    }

    // == Stats ==
    /// Live snapshot of the counters; all zeros when disabled.
    pub fn stats(&self) -> CacheStats {
        self.store
            .as_ref()
            .map(CacheStore::stats)
            .unwrap_or_default()
    }

    fn record_duration(&self, started: Instant, succeeded: bool) {
        let name = if succeeded {
            names::CACHE_OPERATION_DURATION
        } else {
            names::CACHE_OPERATION_DURATION_ERROR
        };
        self.metrics.record_timer(name, started.elapsed());
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> Option<&CacheStore> {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for CacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
