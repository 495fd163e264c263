//! Expired Entry Cleanup Task
//!
//! Background task that periodically purges cache entries whose
//! expire-after-write has elapsed, so memory is reclaimed even for keys that
//! are never read again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheService;

/// Spawns a background task that purges expired cache entries every
/// `interval`.
///
/// The task loops until aborted; keep the returned handle and call
/// `abort()` on it during shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(cache.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(cache: Arc<CacheService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            interval_secs = interval.as_secs(),
            "Starting cache cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.purge_expired();

            if removed > 0 {
                info!(removed, "Cache cleanup: purged expired entries");
            } else {
                debug!("Cache cleanup: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::NoopMetrics;

    fn cache(ttl: Duration) -> Arc<CacheService> {
        Arc::new(CacheService::new(true, 100, ttl, Arc::new(NoopMetrics)))
    }

    #[tokio::test]
    async fn test_cleanup_task_removes_expired_entries() {
        let cache = cache(Duration::from_millis(100));
        cache.put("expire_soon", "value".to_string());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));

        // Wait for entry to expire and cleanup to run
        tokio::time::sleep(Duration::from_millis(400)).await;

        // Purged without anyone reading the key
        let stats = cache.stats();
        assert_eq!(stats.size, 0, "Expired entry should have been purged");
        assert_eq!(stats.eviction_count, 1);

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_preserves_valid_entries() {
        let cache = cache(Duration::from_secs(3600));
        cache.put("long_lived", "value".to_string());

        let handle = spawn_cleanup_task(cache.clone(), Duration::from_millis(50));

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.get::<String>("long_lived").as_deref(), Some("value"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_cleanup_task_can_be_aborted() {
        let handle = spawn_cleanup_task(cache(Duration::from_secs(60)), Duration::from_secs(1));

        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
