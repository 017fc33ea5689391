//! User-record cache trait.
//!
//! The cache holds [`UserProfile`] projections keyed by user ID, with no TTL:
//! an entry persists until it is explicitly overwritten or invalidated. A
//! lookup distinguishes a miss (`Ok(None)`) from a backend failure (`Err`),
//! so callers never have to compare sentinels — the consistency service falls
//! through to the store only on a genuine miss.

use async_trait::async_trait;

use crate::user::{UserId, UserProfile};

/// Errors from the cache backend.
///
/// A miss is not an error; these are genuine backend failures (connection
/// refused, protocol error, undecodable payload).
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache backend could not be reached or rejected the operation.
    #[error("Cache backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },

    /// A cached payload could not be encoded or decoded.
    #[error("Cache serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

/// Cache operations for user profiles.
///
/// Per-key operations only; no cross-key transactions. Implementations must
/// guarantee per-key atomicity of get/set/delete so a concurrent reader
/// observes either the old or the new value, never a torn one.
#[async_trait]
pub trait UserCache: Send + Sync {
    /// Look up a cached profile by user ID.
    ///
    /// Returns `Ok(None)` on a miss.
    ///
    /// # Errors
    ///
    /// Returns an error only on a backend failure, never for a miss.
    async fn get(&self, id: UserId) -> Result<Option<UserProfile>, CacheError>;

    /// Store a profile, overwriting any existing entry for the same ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    async fn set(&self, profile: &UserProfile) -> Result<(), CacheError>;

    /// Remove the entry for a user ID. Removing an absent entry is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    async fn delete(&self, id: UserId) -> Result<(), CacheError>;
}
