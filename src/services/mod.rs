//! Services Module
//!
//! Business operations on users and trades. Services validate input, talk to
//! a repository and emit the business counters. Caching is layered on top by
//! the HTTP handlers.

mod trade_service;
mod user_service;

pub use trade_service::TradeService;
pub use user_service::UserService;
