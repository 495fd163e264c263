//! Metrics Module
//!
//! Counters and timers keyed by name. The cache reports hits, misses, errors
//! and operation durations through a [`MetricsRecorder`]; the HTTP layer reports
//! request counts and business events.

use std::fmt;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tracing::{info, trace};

/// Metric names used across the crate.
pub mod names {
    pub const CACHE_HITS: &str = "cache.hits";
    pub const CACHE_MISSES: &str = "cache.misses";
    pub const CACHE_ERRORS: &str = "cache.errors";
    pub const CACHE_OPERATION_DURATION: &str = "cache.operation.duration";
    pub const CACHE_OPERATION_DURATION_ERROR: &str = "cache.operation.duration.error";

    pub const HTTP_REQUESTS_TOTAL: &str = "http.requests.total";
    pub const HTTP_REQUESTS_ERRORS: &str = "http.requests.errors";
    pub const HTTP_REQUEST_DURATION: &str = "http.request.duration";

    pub const USERS_CREATED: &str = "users.created";
    pub const USERS_UPDATED: &str = "users.updated";
    pub const USERS_DELETED: &str = "users.deleted";
    pub const TRADES_CREATED: &str = "trades.created";
    pub const TRADES_UPDATED: &str = "trades.updated";
    pub const TRADES_DELETED: &str = "trades.deleted";
}

// == Recorder Trait ==
/// Side-channel observability sink.
///
/// Implementations must not panic; nothing the recorder does may change the
/// outcome of the operation being measured.
pub trait MetricsRecorder: Send + Sync {
    /// Increments the counter `name` by one.
    fn increment_counter(&self, name: &str);

    /// Records one observation of `duration` under the timer `name`.
    fn record_timer(&self, name: &str, duration: Duration);
}

/// Recorder that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    #[inline]
    fn increment_counter(&self, _name: &str) {}

    #[inline]
    fn record_timer(&self, _name: &str, _duration: Duration) {}
}

// == Prometheus Recorder ==
/// Prometheus-backed recorder.
///
/// Owns its own recorder instead of installing a process-global one, so several
/// instances (one per test, for example) can coexist.
pub struct PrometheusMetrics {
    inner: Option<(PrometheusRecorder, PrometheusHandle)>,
}

impl PrometheusMetrics {
    /// Creates a recorder. When `enabled` is false every call is a no-op.
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            info!("Metrics disabled");
            return Self { inner: None };
        }

        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        info!("Metrics initialized with Prometheus recorder");

        Self {
            inner: Some((recorder, handle)),
        }
    }

    /// Returns true if metrics are being collected.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Renders all collected metrics in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        match &self.inner {
            Some((_, handle)) => handle.render(),
            None => "# Metrics disabled\n".to_string(),
        }
    }
}

impl fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrometheusMetrics")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl MetricsRecorder for PrometheusMetrics {
    fn increment_counter(&self, name: &str) {
        if let Some((recorder, _)) = &self.inner {
            metrics::with_local_recorder(recorder, || {
                counter!(name.to_owned()).increment(1);
            });
            trace!(counter = name, "Incremented counter");
        }
    }

    fn record_timer(&self, name: &str, duration: Duration) {
        if let Some((recorder, _)) = &self.inner {
            metrics::with_local_recorder(recorder, || {
                histogram!(name.to_owned()).record(duration.as_secs_f64());
            });
            trace!(timer = name, ?duration, "Recorded timer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_render() {
        let metrics = PrometheusMetrics::new(false);
        metrics.increment_counter(names::CACHE_HITS);

        assert!(!metrics.is_enabled());
        assert_eq!(metrics.render(), "# Metrics disabled\n");
    }

    #[test]
    fn test_counter_rendered() {
        let metrics = PrometheusMetrics::new(true);
        metrics.increment_counter(names::CACHE_HITS);
        metrics.increment_counter(names::CACHE_HITS);

        let text = metrics.render();
        // Dots are sanitized to underscores by the exporter
        assert!(text.contains("cache_hits"), "rendered: {}", text);
        assert!(text.contains(" 2"), "rendered: {}", text);
    }

    #[test]
    fn test_timer_rendered() {
        let metrics = PrometheusMetrics::new(true);
        metrics.record_timer(names::HTTP_REQUEST_DURATION, Duration::from_millis(12));

        let text = metrics.render();
        assert!(text.contains("http_request_duration"), "rendered: {}", text);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = PrometheusMetrics::new(true);
        let b = PrometheusMetrics::new(true);
        a.increment_counter(names::USERS_CREATED);

        assert!(a.render().contains("users_created"));
        assert!(!b.render().contains("users_created"));
    }

    #[test]
    fn test_noop_does_nothing() {
        let metrics = NoopMetrics;
        metrics.increment_counter(names::CACHE_ERRORS);
        metrics.record_timer(names::CACHE_OPERATION_DURATION, Duration::from_secs(1));
    }
}
