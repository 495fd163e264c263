//! API Handlers
//!
//! Shared application state, request helpers and the operational endpoints
//! (health, cache statistics, Prometheus scrape).

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::warn;

use crate::cache::CacheService;
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::metrics::{names, MetricsRecorder, PrometheusMetrics};
use crate::models::{HealthResponse, StatsResponse};
use crate::repository::{InMemoryTradeRepository, InMemoryUserRepository};
use crate::services::{TradeService, UserService};
use crate::tasks::WorkerPool;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheService>,
    pub metrics: Arc<PrometheusMetrics>,
    pub users: Arc<UserService>,
    pub trades: Arc<TradeService>,
    /// Runs the blocking page queries
    pub pool: Arc<WorkerPool>,
}

impl AppState {
    pub fn new(
        cache: Arc<CacheService>,
        metrics: Arc<PrometheusMetrics>,
        users: Arc<UserService>,
        trades: Arc<TradeService>,
        pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            cache,
            metrics,
            users,
            trades,
            pool,
        }
    }

    /// Wires every component from configuration, with in-memory repositories.
    pub fn from_config(config: &Config) -> Self {
        let metrics = Arc::new(PrometheusMetrics::new(config.metrics_enabled));
        let recorder: Arc<dyn MetricsRecorder> = metrics.clone();

        let cache = Arc::new(CacheService::from_config(config, recorder.clone()));
        let users = Arc::new(UserService::new(
            Arc::new(InMemoryUserRepository::new()),
            recorder.clone(),
        ));
        let trades = Arc::new(TradeService::new(
            Arc::new(InMemoryTradeRepository::new()),
            recorder,
        ));
        let pool = Arc::new(WorkerPool::new(
            config.worker_threads,
            config.shutdown_timeout(),
        ));

        Self::new(cache, metrics, users, trades, pool)
    }
}

// == Request Helpers ==
/// Parses a path id. Only positive integers identify an entity.
pub(crate) fn parse_id(raw: &str) -> Result<u64> {
    match raw.parse::<u64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::InvalidRequest(format!(
            "Invalid id '{}': expected a positive integer",
            raw
        ))),
    }
}

/// Unwraps a JSON body, turning extractor rejections into 400s.
pub(crate) fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::InvalidRequest(rejection.body_text()))
}

/// Counts the request, times it and counts it again as an error if it failed.
pub(crate) async fn instrumented<T, Fut>(metrics: &dyn MetricsRecorder, handler: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    let started = Instant::now();
    metrics.increment_counter(names::HTTP_REQUESTS_TOTAL);

    let result = handler.await;
    if let Err(e) = &result {
        metrics.increment_counter(names::HTTP_REQUESTS_ERRORS);
        warn!(error = %e, "Request failed");
    }

    metrics.record_timer(names::HTTP_REQUEST_DURATION, started.elapsed());
    result
}

// == Operational Endpoints ==
/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::up(
        state.cache.is_enabled(),
        state.cache.stats(),
    ))
}

/// Handler for the Prometheus scrape endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}
