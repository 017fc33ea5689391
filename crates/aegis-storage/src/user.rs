//! User record model and record-store trait.
//!
//! Defines the interface for durable user persistence. Implementations are
//! provided by storage backends (`InMemoryUserStore` here, PostgreSQL in
//! `aegis-postgres`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::StorageResult;

/// Unique, store-assigned user identifier.
pub type UserId = i64;

// =============================================================================
// User Types
// =============================================================================

/// A user record as held by the record store.
///
/// `id` is assigned by the store on creation and never changes. `username` is
/// unique and mutable; `email` is unique and immutable after registration.
/// `password_hash` is an opaque PHC string produced by the credential hasher;
/// it is stored and compared, never inspected, and never written to the cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Store-assigned unique identifier.
    pub id: UserId,

    /// Unique username for login and display.
    pub username: String,

    /// Unique email address.
    pub email: String,

    /// Opaque password hash (PHC string).
    pub password_hash: String,

    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the record was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl User {
    /// Returns the cache/wire projection of this record.
    ///
    /// The projection carries everything a caller may see; the password hash
    /// stays behind in the store.
    #[must_use]
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// The externally visible projection of a [`User`].
///
/// This is what gets cached and what handlers return. It deliberately has no
/// `password_hash` field, so a serialized profile can never leak credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    /// Store-assigned unique identifier.
    pub id: UserId,

    /// Unique username.
    pub username: String,

    /// Unique email address.
    pub email: String,

    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the record was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Input for creating a user record. The store assigns `id` and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Requested username.
    pub username: String,

    /// Email address.
    pub email: String,

    /// Opaque password hash (PHC string).
    pub password_hash: String,
}

impl NewUser {
    /// Creates a new user input.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }
}

// =============================================================================
// User Store Trait
// =============================================================================

/// Durable storage operations for user records.
///
/// Absent records are reported as `Ok(None)`, never as errors; callers must
/// treat "no such user" as a valid outcome. Every method may fail with a
/// backend error, which callers surface as internal.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by their unique ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, id: UserId) -> StorageResult<Option<User>>;

    /// Find a user by their username.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>>;

    /// Find a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Create a new user record, assigning its ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the username or email is already
    /// taken (the store's unique-index backstop), or a backend error if the
    /// storage operation fails.
    async fn create(&self, user: NewUser) -> StorageResult<User>;

    /// Update a user's username.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist,
    /// `StorageError::Conflict` if the new username is already taken, or a
    /// backend error if the storage operation fails.
    async fn update_username(&self, id: UserId, username: &str) -> StorageResult<()>;

    /// Delete a user record (soft delete where the backend supports it).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the user does not exist, or a
    /// backend error if the storage operation fails.
    async fn delete(&self, id: UserId) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: 7,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$...".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_profile_excludes_password_hash() {
        let user = sample_user();
        let profile = user.profile();

        assert_eq!(profile.id, user.id);
        assert_eq!(profile.username, user.username);
        assert_eq!(profile.email, user.email);

        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
    }

    #[test]
    fn test_profile_round_trip() {
        let profile = sample_user().profile();
        let json = serde_json::to_string(&profile).unwrap();
        let back: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, profile);
    }
}
