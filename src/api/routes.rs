//! API Routes
//!
//! Configures the Axum router with the resource and operational endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{cache_stats_handler, health_handler, metrics_handler, AppState};
use super::trades::{
    create_trade, delete_trade, get_trade, list_trades, list_trades_paginated, update_trade,
};
use super::users::{
    create_user, delete_user, get_user, list_users, list_users_paginated, update_user,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET|POST /api/v1/users`, `GET /api/v1/users/paginated`
/// - `GET|PUT|DELETE /api/v1/users/:id`
/// - the same six routes under `/api/v1/trades`
/// - `GET /health`, `GET /cache/stats`
/// - `GET {metrics_endpoint}` - Prometheus scrape
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState, metrics_endpoint: &str) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/paginated", get(list_users_paginated))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/trades", get(list_trades).post(create_trade))
        .route("/trades/paginated", get(list_trades_paginated))
        .route(
            "/trades/:id",
            get(get_trade).put(update_trade).delete(delete_trade),
        );

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(health_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route(metrics_endpoint, get(metrics_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
