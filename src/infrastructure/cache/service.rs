//! Cache service trait and error types.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::entities::LinkTarget;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("invalid cached value: {0}")]
    InvalidData(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Fast-path cache of alias to [`LinkTarget`] mappings.
///
/// Errors are returned to the caller, which decides how to degrade: a failed
/// read falls back to the store, a failed write is logged and ignored.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Looks up the cached target of an alias.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(target))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] when the backend cannot be reached and
    /// [`CacheError::InvalidData`] when the stored value does not decode.
    async fn get_link(&self, alias: &str) -> CacheResult<Option<LinkTarget>>;

    /// Stores the target of an alias, expiring after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] when the write fails.
    async fn set_link(&self, alias: &str, target: &LinkTarget, ttl: Duration) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    ///
    /// Used by health check endpoints to report cache status.
    async fn health_check(&self) -> bool;
}
