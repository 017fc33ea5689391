//! Cache backend with L1 (DashMap) and optional L2 (Redis) tiers.
//!
//! All operations report backend failures to the caller instead of degrading
//! to a miss. The consistency protocol upstream distinguishes "not cached"
//! from "cache unreachable", so a Redis outage must surface as an error.
//! Writes and deletes are synchronous with respect to the caller; mutation
//! ordering is part of the consistency protocol and fire-and-forget writes
//! would break it.

use std::sync::Arc;

use dashmap::DashMap;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use aegis_storage::CacheError;

/// Two-tier cache backend: L1 (DashMap) + optional L2 (Redis).
///
/// - **Local**: single-instance mode using only DashMap
/// - **Redis**: multi-instance mode with DashMap (L1) + Redis (L2)
///
/// Entries carry no TTL; consistency comes from write-through and explicit
/// invalidation, not expiry.
#[derive(Clone)]
pub enum CacheBackend {
    /// Single-instance: local DashMap only
    Local(Arc<DashMap<String, Arc<Vec<u8>>>>),

    /// Multi-instance: Redis + local L1
    Redis {
        redis: Pool,
        local: Arc<DashMap<String, Arc<Vec<u8>>>>,
    },
}

impl CacheBackend {
    /// Create a new local-only cache backend.
    pub fn new_local() -> Self {
        CacheBackend::Local(Arc::new(DashMap::new()))
    }

    /// Create a new Redis-backed cache backend.
    pub fn new_redis(redis_pool: Pool) -> Self {
        CacheBackend::Redis {
            redis: redis_pool,
            local: Arc::new(DashMap::new()),
        }
    }

    /// Get a value from the cache.
    ///
    /// Lookup order: L1 (DashMap), then L2 (Redis). A value found in L2 is
    /// promoted to L1. `Ok(None)` is a miss; `Err` means the backend could
    /// not answer.
    pub async fn get(&self, key: &str) -> Result<Option<Arc<Vec<u8>>>, CacheError> {
        match self {
            CacheBackend::Local(map) => Ok(map.get(key).map(|entry| Arc::clone(entry.value()))),
            CacheBackend::Redis { redis, local } => {
                if let Some(entry) = local.get(key) {
                    tracing::debug!(key = %key, "cache hit (L1)");
                    return Ok(Some(Arc::clone(entry.value())));
                }

                let mut conn = redis
                    .get()
                    .await
                    .map_err(|e| CacheError::backend(e.to_string()))?;
                let data: Option<Vec<u8>> = conn
                    .get(key)
                    .await
                    .map_err(|e| CacheError::backend(e.to_string()))?;

                match data {
                    Some(data) => {
                        tracing::debug!(key = %key, "cache hit (L2)");
                        let data = Arc::new(data);
                        local.insert(key.to_string(), Arc::clone(&data));
                        Ok(Some(data))
                    }
                    None => {
                        tracing::debug!(key = %key, "cache miss");
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Set a value in the cache.
    ///
    /// In Redis mode the L2 write happens first; L1 is only updated once the
    /// shared tier holds the value, so a Redis failure leaves both tiers
    /// unchanged.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.insert(key.to_string(), Arc::new(value));
                Ok(())
            }
            CacheBackend::Redis { redis, local } => {
                let mut conn = redis
                    .get()
                    .await
                    .map_err(|e| CacheError::backend(e.to_string()))?;
                conn.set::<_, _, ()>(key, value.as_slice())
                    .await
                    .map_err(|e| CacheError::backend(e.to_string()))?;
                local.insert(key.to_string(), Arc::new(value));
                Ok(())
            }
        }
    }

    /// Remove a cache entry.
    ///
    /// Removing an absent key succeeds. In Redis mode L2 is deleted first;
    /// L1 keeps its entry if the shared delete fails, matching `set`.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        match self {
            CacheBackend::Local(map) => {
                map.remove(key);
                Ok(())
            }
            CacheBackend::Redis { redis, local } => {
                let mut conn = redis
                    .get()
                    .await
                    .map_err(|e| CacheError::backend(e.to_string()))?;
                conn.del::<_, ()>(key)
                    .await
                    .map_err(|e| CacheError::backend(e.to_string()))?;
                local.remove(key);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_set_get_delete() {
        let backend = CacheBackend::new_local();

        assert!(backend.get("k").await.unwrap().is_none());

        backend.set("k", b"value".to_vec()).await.unwrap();
        let hit = backend.get("k").await.unwrap().unwrap();
        assert_eq!(hit.as_slice(), b"value");

        backend.delete("k").await.unwrap();
        assert!(backend.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_set_overwrites() {
        let backend = CacheBackend::new_local();
        backend.set("k", b"old".to_vec()).await.unwrap();
        backend.set("k", b"new".to_vec()).await.unwrap();
        let hit = backend.get("k").await.unwrap().unwrap();
        assert_eq!(hit.as_slice(), b"new");
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let backend = CacheBackend::new_local();
        backend.delete("missing").await.unwrap();
    }
}
