//! API Module
//!
//! HTTP handlers and routing for the Users and Trades REST API.
//!
//! # Endpoints
//! - `/api/v1/users[...]` - User CRUD and paginated listing
//! - `/api/v1/trades[...]` - Trade CRUD and paginated listing
//! - `GET /health` - Health check including cache status
//! - `GET /cache/stats` - Cache statistics
//! - `GET /metrics` - Prometheus scrape (path configurable)

pub mod handlers;
pub mod routes;
pub mod trades;
pub mod users;

pub use handlers::AppState;
pub use routes::create_router;
