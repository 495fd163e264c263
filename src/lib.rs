//! Trade API - Users and Trades REST service
//!
//! CRUD and paginated listing for users and trades, fronted by a bounded,
//! expiring cache-aside layer with Prometheus metrics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;
pub mod tasks;

pub use api::{create_router, AppState};
pub use config::Config;
pub use tasks::{spawn_cleanup_task, WorkerPool};
