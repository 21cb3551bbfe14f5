//! No-op cache implementation.

use super::service::{CacheResult, CacheService};
use crate::domain::entities::LinkTarget;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A cache that never stores anything.
///
/// Every lookup misses, so redirects fall through to the store. Used as the
/// fallback when the cache connection cannot be established at startup.
pub struct NullCache;

impl NullCache {
    /// Creates a new NullCache instance.
    pub fn new() -> Self {
        debug!("Using NullCache (caching disabled)");
        Self
    }
}

impl Default for NullCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheService for NullCache {
    async fn get_link(&self, _alias: &str) -> CacheResult<Option<LinkTarget>> {
        Ok(None)
    }

    async fn set_link(
        &self,
        _alias: &str,
        _target: &LinkTarget,
        _ttl: Duration,
    ) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_cache_always_misses() {
        let cache = NullCache::new();
        let target = LinkTarget {
            url: "https://example.com".to_string(),
            link_id: 1,
        };

        cache
            .set_link("abc123", &target, Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get_link("abc123").await.unwrap(), None);
    }
}
