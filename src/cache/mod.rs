//! Cache Module
//!
//! Bounded, expiring, cache-aside caching with hit/miss/eviction accounting.

mod entry;
mod lru;
mod service;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use service::CacheService;
pub use stats::CacheStats;
pub use store::CacheStore;

// == Key Helpers ==
/// Key for a single user looked up by id.
pub fn user_key(id: u64) -> String {
    format!("user:{}", id)
}

/// Key for a single trade looked up by id.
pub fn trade_key(id: u64) -> String {
    format!("trade:{}", id)
}

/// Key for the unpaginated list of all users.
pub const USERS_ALL_KEY: &str = "users:all";

/// Key for the unpaginated list of all trades.
pub const TRADES_ALL_KEY: &str = "trades:all";
