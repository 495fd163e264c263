//! Background Tasks Module
//!
//! # Tasks
//! - Cache cleanup: purges expired cache entries at the configured interval
//! - Worker pool: bounded executor for blocking repository work

mod cleanup;
mod worker_pool;

pub use cleanup::spawn_cleanup_task;
pub use worker_pool::{ShutdownOutcome, WorkerPool};
