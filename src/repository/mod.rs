//! Repository Module
//!
//! Storage traits for users and trades plus their in-memory implementations.
//! Repository calls are synchronous and may block; the HTTP layer runs the
//! paginated queries on the worker pool.

mod memory;

pub use memory::{InMemoryTradeRepository, InMemoryUserRepository};

use crate::error::Result;
use crate::models::{Sort, Trade, TradeInput, User, UserInput};

/// Persistent storage for users.
pub trait UserRepository: Send + Sync {
    fn find_by_id(&self, id: u64) -> Result<Option<User>>;

    /// Every user, in id order.
    fn find_all(&self) -> Result<Vec<User>>;

    /// At most `limit` users starting at row `offset` of the requested order.
    fn fetch_page(&self, offset: u64, limit: u32, sort: &Sort) -> Result<Vec<User>>;

    fn count(&self) -> Result<u64>;

    /// Stores a new user under a freshly assigned id.
    fn insert(&self, input: UserInput) -> Result<User>;

    /// Replaces the user with `id`. `None` when no such user exists.
    fn update(&self, id: u64, input: UserInput) -> Result<Option<User>>;

    /// Returns whether a user was removed.
    fn delete(&self, id: u64) -> Result<bool>;
}

/// Persistent storage for trades.
pub trait TradeRepository: Send + Sync {
    fn find_by_id(&self, id: u64) -> Result<Option<Trade>>;

    fn find_all(&self) -> Result<Vec<Trade>>;

    fn fetch_page(&self, offset: u64, limit: u32, sort: &Sort) -> Result<Vec<Trade>>;

    fn count(&self) -> Result<u64>;

    fn insert(&self, input: TradeInput) -> Result<Trade>;

    fn update(&self, id: u64, input: TradeInput) -> Result<Option<Trade>>;

    fn delete(&self, id: u64) -> Result<bool>;
}
