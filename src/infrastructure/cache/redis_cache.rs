//! Redis-backed cache implementation.

use super::service::{CacheError, CacheResult, CacheService};
use crate::domain::entities::LinkTarget;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Key namespace. Bump the version when the cached value format changes.
const KEY_PREFIX: &str = "link:v1:";

/// Redis cache implementation for fast alias lookups.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// Values are [`LinkTarget`] serialized as JSON.
pub struct RedisCache {
    client: ConnectionManager,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the URL is invalid, the connection cannot
    /// be established, or the PING health check fails.
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        let client = Client::open(redis_url).map_err(|e| {
            CacheError::Unavailable(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            CacheError::Unavailable(format!("Failed to connect to Redis: {}", e))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| CacheError::Unavailable(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis cache");

        Ok(Self { client: manager })
    }

    fn build_key(alias: &str) -> String {
        format!("{}{}", KEY_PREFIX, alias)
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_link(&self, alias: &str) -> CacheResult<Option<LinkTarget>> {
        let key = Self::build_key(alias);
        let mut conn = self.client.clone();

        let raw: Option<String> = conn.get(&key).await?;

        match raw {
            Some(raw) => {
                let target = decode_target(&raw)?;
                debug!("Cache HIT: {} -> {}", alias, target.url);
                Ok(Some(target))
            }
            None => {
                debug!("Cache MISS: {}", alias);
                Ok(None)
            }
        }
    }

    async fn set_link(&self, alias: &str, target: &LinkTarget, ttl: Duration) -> CacheResult<()> {
        let key = Self::build_key(alias);
        let value = serde_json::to_string(target)
            .map_err(|e| CacheError::InvalidData(e.to_string()))?;
        let seconds = ttl.as_secs().max(1);

        let mut conn = self.client.clone();
        let _: () = conn.set_ex(&key, value, seconds).await?;

        debug!("Cache SET: {} -> {} (TTL: {}s)", alias, target.url, seconds);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}

fn decode_target(raw: &str) -> CacheResult<LinkTarget> {
    serde_json::from_str(raw).map_err(|e| CacheError::InvalidData(e.to_string()))
}
