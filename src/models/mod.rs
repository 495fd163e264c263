//! Request and Response models for the API
//!
//! Entities, their input payloads, pagination types and the bodies of the
//! operational endpoints.

pub mod pagination;
pub mod responses;
pub mod trade;
pub mod user;

// Re-export commonly used types
pub use pagination::{PageMetadata, PageQuery, PageRequest, PageResponse, Sort, SortDirection};
pub use responses::{CacheHealth, HealthResponse, StatsResponse};
pub use trade::{Trade, TradeInput};
pub use user::{User, UserInput};
