//! Response DTOs for the operational endpoints
//!
//! Defines the bodies of `/health` and `/cache/stats`.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for GET /cache/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
    /// Current number of entries in cache
    pub size: u64,
    /// hits / (hits + misses), 0 when nothing was looked up
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_count: stats.hit_count,
            miss_count: stats.miss_count,
            eviction_count: stats.eviction_count,
            size: stats.size,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// Cache section of the health report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheHealth {
    pub status: String,
    pub enabled: bool,
    pub hit_rate: f64,
    pub size: u64,
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "UP" while the server answers
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    pub cache: CacheHealth,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn up(enabled: bool, stats: CacheStats) -> Self {
        let cache_status = if enabled { "UP" } else { "DISABLED" };
        Self {
            status: "UP".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            cache: CacheHealth {
                status: cache_status.to_string(),
                enabled,
                hit_rate: stats.hit_rate(),
                size: stats.size,
            },
        }
    }
}
