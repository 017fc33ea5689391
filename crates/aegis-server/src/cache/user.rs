//! User profile caching.
//!
//! Caches serialized [`UserProfile`] values on top of [`CacheBackend`],
//! implementing the [`UserCache`] trait the consistency service consumes.
//!
//! ## Cache Key Format
//!
//! `user:{id}` — e.g. `user:42`
//!
//! ## Payload
//!
//! MessagePack via `rmp-serde`. The password hash is never part of the
//! payload; the cache holds profiles, not credentials. An entry that fails
//! to decode is removed and reported as a miss so the caller repopulates it
//! from the store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use aegis_storage::{CacheError, UserCache, UserId, UserProfile};

use super::backend::CacheBackend;

/// Cached profile entry serialized as MessagePack for compact storage.
#[derive(Serialize, Deserialize)]
struct CachedProfile {
    id: i64,
    username: String,
    email: String,
    created_at_ts: i64,
    updated_at_ts: i64,
}

impl CachedProfile {
    fn from_profile(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            email: profile.email.clone(),
            created_at_ts: profile.created_at.unix_timestamp(),
            updated_at_ts: profile.updated_at.unix_timestamp(),
        }
    }

    fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username,
            email: self.email,
            created_at: OffsetDateTime::from_unix_timestamp(self.created_at_ts)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
            updated_at: OffsetDateTime::from_unix_timestamp(self.updated_at_ts)
                .unwrap_or(OffsetDateTime::UNIX_EPOCH),
        }
    }
}

/// User profile cache over a [`CacheBackend`].
#[derive(Clone)]
pub struct UserProfileCache {
    backend: CacheBackend,
}

impl UserProfileCache {
    /// Create a new profile cache with the given backend.
    pub fn new(backend: CacheBackend) -> Self {
        Self { backend }
    }

    #[inline]
    fn cache_key(id: UserId) -> String {
        format!("user:{id}")
    }
}

#[async_trait]
impl UserCache for UserProfileCache {
    async fn get(&self, id: UserId) -> Result<Option<UserProfile>, CacheError> {
        let key = Self::cache_key(id);
        let Some(data) = self.backend.get(&key).await? else {
            return Ok(None);
        };

        match rmp_serde::from_slice::<CachedProfile>(&data) {
            Ok(cached) => Ok(Some(cached.into_profile())),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to deserialize cached profile");
                self.backend.delete(&key).await?;
                Ok(None)
            }
        }
    }

    async fn set(&self, profile: &UserProfile) -> Result<(), CacheError> {
        let key = Self::cache_key(profile.id);
        let data = rmp_serde::to_vec(&CachedProfile::from_profile(profile))
            .map_err(|e| CacheError::serialization(e.to_string()))?;
        self.backend.set(&key, data).await
    }

    async fn delete(&self, id: UserId) -> Result<(), CacheError> {
        self.backend.delete(&Self::cache_key(id)).await
    }
}
