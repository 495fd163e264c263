//! Configuration Module
//!
//! Handles loading and validating server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};

/// Paths already served by the router; the metrics endpoint may not reuse them.
const RESERVED_PATHS: [&str; 2] = ["/health", "/cache/stats"];
const API_PREFIX: &str = "/api/v1";

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub server_host: String,
    /// HTTP server port
    pub server_port: u16,
    /// Whether the cache-aside layer is active
    pub cache_enabled: bool,
    /// Maximum number of cache entries
    pub cache_max_size: usize,
    /// Minutes an entry stays valid after its last write
    pub cache_expire_after_write_minutes: u64,
    /// Interval in seconds between background purges of expired entries
    pub cache_cleanup_interval: u64,
    /// Whether metrics are collected
    pub metrics_enabled: bool,
    /// Path the Prometheus scrape endpoint is served on
    pub metrics_endpoint: String,
    /// Maximum number of blocking tasks running at once
    pub worker_threads: usize,
    /// Seconds to wait for in-flight tasks on shutdown before cancelling them
    pub shutdown_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_HOST` - Bind address (default: 0.0.0.0)
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `CACHE_ENABLED` - Enable the cache (default: true)
    /// - `CACHE_MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `CACHE_EXPIRE_AFTER_WRITE_MINUTES` - Entry lifetime (default: 30)
    /// - `CACHE_CLEANUP_INTERVAL_SECS` - Purge frequency (default: 60)
    /// - `METRICS_ENABLED` - Enable metrics (default: true)
    /// - `METRICS_ENDPOINT` - Scrape path (default: /metrics)
    /// - `WORKER_THREADS` - Worker pool size (default: 2 x available cores)
    /// - `SHUTDOWN_TIMEOUT_SECS` - Graceful drain timeout (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_env("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_enabled: bool_env("CACHE_ENABLED").unwrap_or(defaults.cache_enabled),
            cache_max_size: parse_env("CACHE_MAX_SIZE").unwrap_or(defaults.cache_max_size),
            cache_expire_after_write_minutes: parse_env("CACHE_EXPIRE_AFTER_WRITE_MINUTES")
                .unwrap_or(defaults.cache_expire_after_write_minutes),
            cache_cleanup_interval: parse_env("CACHE_CLEANUP_INTERVAL_SECS")
                .unwrap_or(defaults.cache_cleanup_interval),
            metrics_enabled: bool_env("METRICS_ENABLED").unwrap_or(defaults.metrics_enabled),
            metrics_endpoint: env::var("METRICS_ENDPOINT").unwrap_or(defaults.metrics_endpoint),
            worker_threads: parse_env("WORKER_THREADS").unwrap_or(defaults.worker_threads),
            shutdown_timeout: parse_env("SHUTDOWN_TIMEOUT_SECS")
                .unwrap_or(defaults.shutdown_timeout),
        }
    }

    /// Rejects settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_max_size == 0 {
            bail!("CACHE_MAX_SIZE must be positive");
        }
        if self.cache_expire_after_write_minutes == 0 {
            bail!("CACHE_EXPIRE_AFTER_WRITE_MINUTES must be positive");
        }
        if self.cache_expire_after_write_minutes.checked_mul(60).is_none() {
            bail!("CACHE_EXPIRE_AFTER_WRITE_MINUTES is too large");
        }
        if self.cache_cleanup_interval == 0 {
            bail!("CACHE_CLEANUP_INTERVAL_SECS must be positive");
        }
        if self.worker_threads == 0 {
            bail!("WORKER_THREADS must be positive");
        }
        if !self.metrics_endpoint.starts_with('/') {
            bail!("METRICS_ENDPOINT must start with '/'");
        }
        validate_metrics_path(&self.metrics_endpoint)?;
        Ok(())
    }

    pub fn expire_after_write(&self) -> Duration {
        Duration::from_secs(self.cache_expire_after_write_minutes.saturating_mul(60))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache_cleanup_interval)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            cache_enabled: true,
            cache_max_size: 1000,
            cache_expire_after_write_minutes: 30,
            cache_cleanup_interval: 60,
            metrics_enabled: true,
            metrics_endpoint: "/metrics".to_string(),
            worker_threads: default_worker_threads(),
            shutdown_timeout: 30,
        }
    }
}

/// The metrics path is registered as a literal route, so it must not collide
/// with another route or contain axum path captures.
fn validate_metrics_path(path: &str) -> Result<()> {
    if path.contains(':') || path.contains('*') {
        bail!("METRICS_ENDPOINT must not contain ':' or '*': {}", path);
    }
    let trimmed = path.trim_end_matches('/');
    if RESERVED_PATHS.contains(&trimmed) {
        bail!("METRICS_ENDPOINT {} is already routed", path);
    }
    if trimmed == API_PREFIX || path.starts_with(&format!("{}/", API_PREFIX)) {
        bail!("METRICS_ENDPOINT must not be under {}", API_PREFIX);
    }
    Ok(())
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(4)
}

fn parse_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn bool_env(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|v| parse_bool(&v))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 8080);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_max_size, 1000);
        assert_eq!(config.expire_after_write(), Duration::from_secs(30 * 60));
        assert_eq!(config.metrics_endpoint, "/metrics");
        assert!(config.worker_threads > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "CACHE_ENABLED",
            "CACHE_MAX_SIZE",
            "CACHE_EXPIRE_AFTER_WRITE_MINUTES",
            "METRICS_ENABLED",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 8080);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_max_size, 1000);
        assert_eq!(config.cache_expire_after_write_minutes, 30);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" no "), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = Config {
            cache_max_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_metrics_path() {
        let config = Config {
            metrics_endpoint: "metrics".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_reserved_metrics_path() {
        for path in [
            "/health",
            "/cache/stats",
            "/api/v1",
            "/api/v1/users",
            "/:id",
            "/*rest",
        ] {
            let config = Config {
                metrics_endpoint: path.to_string(),
                ..Config::default()
            };
            assert!(config.validate().is_err(), "{} should be rejected", path);
        }

        let config = Config {
            metrics_endpoint: "/internal/prom".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_expiry() {
        let config = Config {
            cache_expire_after_write_minutes: u64::MAX / 30,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(config.expire_after_write(), Duration::from_secs(u64::MAX));
    }
}
