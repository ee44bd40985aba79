//! Redis-backed caching layer for recent-video id lists.
//!
//! The cache is advisory: entries may be absent, stale, or partially
//! invalidated without affecting correctness. A backend outage therefore
//! degrades reads to a miss and writes to a logged no-op instead of
//! surfacing an error to the read path.

use async_trait::async_trait;
use log::{debug, warn};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::fmt;

use crate::error::VideoServiceError;

/// Key-value store mapping a channel to its ordered recent-video ids.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Best-effort lookup. `None` covers both a genuine miss and a cache
    /// backend failure.
    async fn get_ids(&self, channel_id: &str) -> Option<Vec<String>>;

    /// Last-writer-wins single-key write with a fixed TTL in seconds.
    async fn set_ids(&self, channel_id: &str, ids: &[String], ttl_secs: u64);
}

/// A shared Redis cache client.
/// Uses a `ConnectionManager` for automatic reconnection and resilience.
#[derive(Clone)]
pub struct RedisCache {
    conn_manager: ConnectionManager,
    key_prefix: String,
    redis_url: String, // kept for Debug output
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("redis_url", &self.redis_url)
            .field("key_prefix", &self.key_prefix)
            .field("conn_manager", &"<ConnectionManager instance>")
            .finish()
    }
}

impl RedisCache {
    pub async fn new(redis_url: &str, key_prefix: &str) -> Result<Self, VideoServiceError> {
        log::info!("Initializing Redis connection manager for URL: {redis_url}");
        let client = redis::Client::open(redis_url)
            .map_err(|e| VideoServiceError::Cache(format!("Invalid Redis URL: {e}")))?;
        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            VideoServiceError::Cache(format!("Failed to create Redis ConnectionManager: {e}"))
        })?;
        Ok(Self {
            conn_manager,
            key_prefix: key_prefix.to_string(),
            redis_url: redis_url.to_string(),
        })
    }

    fn generate_key(&self, channel_id: &str) -> String {
        cache_key(&self.key_prefix, channel_id)
    }
}

/// Key format shared with the sweeper: `{prefix}:{channel_id}`.
pub fn cache_key(prefix: &str, channel_id: &str) -> String {
    format!("{prefix}:{channel_id}")
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_ids(&self, channel_id: &str) -> Option<Vec<String>> {
        let key = self.generate_key(channel_id);
        debug!("Attempting to GET cache for key: {key}");

        let mut conn = self.conn_manager.clone();
        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(value_str)) => match serde_json::from_str::<Vec<String>>(&value_str) {
                Ok(ids) => {
                    debug!("Cache HIT for key: {key} ({} ids)", ids.len());
                    Some(ids)
                }
                Err(e) => {
                    warn!("Failed to deserialize cached ids for key {key}: {e}. Data: '{value_str}'");
                    None
                }
            },
            Ok(None) => {
                debug!("Cache MISS for key: {key}");
                None
            }
            Err(e) => {
                // Treat an unreachable backend as a miss; the store answers.
                warn!("Redis GET error for key {key}: {e}");
                None
            }
        }
    }

    async fn set_ids(&self, channel_id: &str, ids: &[String], ttl_secs: u64) {
        let key = self.generate_key(channel_id);
        let value_str = match serde_json::to_string(ids) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize ids for key {key}: {e}");
                return;
            }
        };

        let mut conn = self.conn_manager.clone();
        match conn.set_ex::<_, _, ()>(&key, value_str, ttl_secs).await {
            Ok(()) => debug!("Cache SETEX success for key: {key} with TTL: {ttl_secs}s"),
            Err(e) => warn!("Failed to SETEX key '{key}' in Redis: {e}"),
        }
    }
}
