//! Cache Entry Module
//!
//! A single stored value with the instant it was written, used for
//! expire-after-write.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

// == Cache Entry ==
/// A type-erased value plus write metadata.
///
/// The concrete type is recovered on read with a downcast; a mismatch is
/// reported by the store, never by the entry.
#[derive(Clone)]
pub struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    written_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Wraps `value`, stamping it with the current instant.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
            written_at: Instant::now(),
        }
    }

    /// Returns a reference to the value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Name of the type the value was stored as.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Time since the value was written.
    pub fn age(&self) -> Duration {
        self.written_at.elapsed()
    }

    // == Is Expired ==
    /// An entry is expired once `ttl` has fully elapsed since it was written.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("type_name", &self.type_name)
            .field("age", &self.age())
            .finish()
    }
}
