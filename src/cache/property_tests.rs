//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the counting, capacity and recency invariants of the
//! store and the cache-aside facade.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheService, CacheStore};
use crate::metrics::NoopMetrics;

// == Test Configuration ==
const TEST_MAX_SIZE: usize = 100;
const TEST_TTL: Duration = Duration::from_secs(3600);

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,32}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: String, value: String },
    Get { key: String },
    Evict { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), value_strategy()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Evict { key }),
    ]
}

fn service(max_size: usize) -> CacheService {
    CacheService::new(true, max_size, TEST_TTL, Arc::new(NoopMetrics))
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Hits and misses reported by stats match what the caller observed, and
    // the hit rate is exactly H / (H + M).
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let cache = service(TEST_MAX_SIZE);
        let mut hits: u64 = 0;
        let mut misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => cache.put(&key, value),
                CacheOp::Get { key } => match cache.get::<String>(&key) {
                    Some(_) => hits += 1,
                    None => misses += 1,
                },
                CacheOp::Evict { key } => cache.evict(&key),
            }
        }

        let stats = cache.stats();
        prop_assert_eq!(stats.hit_count, hits);
        prop_assert_eq!(stats.miss_count, misses);
        if hits + misses == 0 {
            prop_assert_eq!(stats.hit_rate(), 0.0);
        } else {
            let expected = hits as f64 / (hits + misses) as f64;
            prop_assert!((stats.hit_rate() - expected).abs() < 1e-9);
        }
    }

    // A put immediately followed by a get returns the same value.
    #[test]
    fn prop_put_then_get(key in key_strategy(), value in value_strategy()) {
        let cache = service(TEST_MAX_SIZE);

        cache.put(&key, value.clone());

        prop_assert_eq!(cache.get::<String>(&key), Some(value));
    }

    // Evicting twice is safe and the second call changes nothing.
    #[test]
    fn prop_evict_idempotent(key in key_strategy(), value in value_strategy()) {
        let cache = service(TEST_MAX_SIZE);
        cache.put(&key, value);

        cache.evict(&key);
        let after_first = cache.stats();
        cache.evict(&key);

        prop_assert_eq!(cache.stats(), after_first);
        prop_assert_eq!(cache.get::<String>(&key), None);
    }

    // The last write to a key wins and does not grow the store.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        first in value_strategy(),
        second in value_strategy()
    ) {
        let store = CacheStore::new(TEST_MAX_SIZE, TEST_TTL);

        store.put(&key, first).unwrap();
        store.put(&key, second.clone()).unwrap();

        prop_assert_eq!(store.get::<String>(&key).unwrap(), Some(second));
        prop_assert_eq!(store.len(), 1);
    }

    // Inserting max_size + N distinct keys leaves at most max_size entries
    // and at least N evictions.
    #[test]
    fn prop_capacity_enforcement(
        max_size in 1usize..20,
        keys in prop::collection::vec(key_strategy(), 1..80)
    ) {
        let keys = unique(keys);
        let cache = service(max_size);

        for key in &keys {
            cache.put(key, key.clone());
            prop_assert!(cache.stats().size as usize <= max_size);
        }

        let overflow = keys.len().saturating_sub(max_size) as u64;
        prop_assert!(cache.stats().eviction_count >= overflow);
    }

    // A miss computes once; later calls are served from the cache.
    #[test]
    fn prop_get_or_compute_runs_supplier_once(key in key_strategy(), value in value_strategy()) {
        let cache = service(TEST_MAX_SIZE);
        let mut calls = 0;

        for _ in 0..3 {
            let got: Result<String, ()> = cache.get_or_compute(&key, || {
                calls += 1;
                Ok(value.clone())
            });
            prop_assert_eq!(got, Ok(value.clone()));
        }

        prop_assert_eq!(calls, 1);
    }

    // Same property through the async entry point.
    #[test]
    fn prop_get_or_compute_async_runs_supplier_once(key in key_strategy(), value in value_strategy()) {
        let cache = service(TEST_MAX_SIZE);
        let mut calls = 0;

        for _ in 0..3 {
            let got: Result<String, ()> = tokio_test::block_on(cache.get_or_compute_async(&key, || {
                calls += 1;
                let value = value.clone();
                async move { Ok(value) }
            }));
            prop_assert_eq!(got, Ok(value.clone()));
        }

        prop_assert_eq!(calls, 1);
    }
}

// Recency-based eviction
proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Filling the store and adding one more key evicts the first key written.
    #[test]
    fn prop_lru_eviction_order(
        keys in prop::collection::vec(key_strategy(), 3..10),
        new_key in key_strategy()
    ) {
        let keys = unique(keys);
        prop_assume!(keys.len() >= 2);
        prop_assume!(!keys.contains(&new_key));

        let store = CacheStore::new(keys.len(), TEST_TTL);
        for key in &keys {
            store.put(key, key.clone()).unwrap();
        }

        store.put(&new_key, new_key.clone()).unwrap();

        prop_assert_eq!(store.len(), keys.len());
        prop_assert_eq!(store.get::<String>(&keys[0]).unwrap(), None);
        prop_assert!(store.get::<String>(&new_key).unwrap().is_some());
        for key in keys.iter().skip(1) {
            prop_assert!(store.get::<String>(key).unwrap().is_some(), "{} should survive", key);
        }
    }

    // Reading a key protects it from being the next victim.
    #[test]
    fn prop_lru_access_tracking(
        keys in prop::collection::vec(key_strategy(), 3..8),
        new_key in key_strategy()
    ) {
        let keys = unique(keys);
        prop_assume!(keys.len() >= 3);
        prop_assume!(!keys.contains(&new_key));

        let store = CacheStore::new(keys.len(), TEST_TTL);
        for key in &keys {
            store.put(key, key.clone()).unwrap();
        }

        store.get::<String>(&keys[0]).unwrap();
        store.put(&new_key, new_key.clone()).unwrap();

        prop_assert!(store.get::<String>(&keys[0]).unwrap().is_some());
        prop_assert_eq!(store.get::<String>(&keys[1]).unwrap(), None);
    }
}

// Concurrent access through a shared facade
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Concurrent readers only ever observe complete values that some writer
    // stored, and the store never exceeds its capacity.
    #[test]
    fn prop_concurrent_operation_correctness(
        operations in prop::collection::vec(cache_op_strategy(), 10..60)
    ) {
        let written: HashSet<String> = operations
            .iter()
            .filter_map(|op| match op {
                CacheOp::Put { value, .. } => Some(value.clone()),
                _ => None,
            })
            .collect();
        let max_size = 16;

        let rt = tokio::runtime::Runtime::new().unwrap();
        let result: Result<(), String> = rt.block_on(async {
            let cache = Arc::new(service(max_size));
            let mut handles = Vec::new();

            for op in operations {
                let cache = cache.clone();
                handles.push(tokio::spawn(async move {
                    match op {
                        CacheOp::Put { key, value } => {
                            cache.put(&key, value);
                            None
                        }
                        CacheOp::Get { key } => cache.get::<String>(&key),
                        CacheOp::Evict { key } => {
                            cache.evict(&key);
                            None
                        }
                    }
                }));
            }

            for handle in handles {
                let observed = handle.await.map_err(|e| e.to_string())?;
                if let Some(value) = observed {
                    if !written.contains(&value) {
                        return Err(format!("observed a value nobody wrote: {}", value));
                    }
                }
            }

            if cache.stats().size as usize > max_size {
                return Err("capacity exceeded".to_string());
            }
            Ok(())
        });

        prop_assert!(result.is_ok(), "{:?}", result);
    }
}
