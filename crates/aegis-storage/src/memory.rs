//! In-memory implementations of the store and cache traits.
//!
//! Used for tests and for running the server without external backends. The
//! store enforces the same uniqueness rules a relational unique index would,
//! so service-level conflict handling can be exercised without a database.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use time::OffsetDateTime;

use crate::cache::{CacheError, UserCache};
use crate::error::{ConflictField, StorageError, StorageResult};
use crate::user::{NewUser, User, UserId, UserProfile, UserStore};

// =============================================================================
// In-Memory Store
// =============================================================================

/// In-memory user store backed by a concurrent map.
///
/// IDs are assigned from an atomic counter, mimicking a relational
/// auto-increment column.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<UserId, User>,
    next_id: AtomicI64,
}

impl InMemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of live records, for tests and diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Returns `true` if the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn find_where(&self, pred: impl Fn(&User) -> bool) -> Option<User> {
        self.users
            .iter()
            .find(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_id(&self, id: UserId) -> StorageResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self.find_where(|u| u.username == username))
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        Ok(self.find_where(|u| u.email == email))
    }

    async fn create(&self, user: NewUser) -> StorageResult<User> {
        // Unique-index backstop, same role as the database constraint.
        if self.find_where(|u| u.username == user.username).is_some() {
            return Err(StorageError::conflict(
                ConflictField::Username,
                format!("username '{}' already exists", user.username),
            ));
        }
        if self.find_where(|u| u.email == user.email).is_some() {
            return Err(StorageError::conflict(
                ConflictField::Email,
                format!("email '{}' already exists", user.email),
            ));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = OffsetDateTime::now_utc();
        let created = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, created.clone());
        Ok(created)
    }

    async fn update_username(&self, id: UserId, username: &str) -> StorageResult<()> {
        if self
            .find_where(|u| u.username == username && u.id != id)
            .is_some()
        {
            return Err(StorageError::conflict(
                ConflictField::Username,
                format!("username '{username}' already exists"),
            ));
        }

        match self.users.get_mut(&id) {
            Some(mut entry) => {
                let user = entry.value_mut();
                user.username = username.to_string();
                user.updated_at = OffsetDateTime::now_utc();
                Ok(())
            }
            None => Err(StorageError::not_found(id)),
        }
    }

    async fn delete(&self, id: UserId) -> StorageResult<()> {
        match self.users.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StorageError::not_found(id)),
        }
    }
}

// =============================================================================
// In-Memory Cache
// =============================================================================

/// In-memory user-profile cache backed by a concurrent map, no TTL.
#[derive(Debug, Default)]
pub struct InMemoryUserCache {
    entries: DashMap<UserId, UserProfile>,
}

impl InMemoryUserCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns `true` if an entry exists for the given ID, for tests.
    #[must_use]
    pub fn contains(&self, id: UserId) -> bool {
        self.entries.contains_key(&id)
    }
}

#[async_trait]
impl UserCache for InMemoryUserCache {
    async fn get(&self, id: UserId) -> Result<Option<UserProfile>, CacheError> {
        Ok(self.entries.get(&id).map(|entry| entry.value().clone()))
    }

    async fn set(&self, profile: &UserProfile) -> Result<(), CacheError> {
        self.entries.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn delete(&self, id: UserId) -> Result<(), CacheError> {
        self.entries.remove(&id);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser::new(name, email, "$argon2id$fake")
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("alice", "a@x.com")).await.unwrap();
        let b = store.create(new_user("bob", "b@x.com")).await.unwrap();
        assert!(b.id > a.id);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_lookups() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("alice", "a@x.com")).await.unwrap();

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_name = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_email = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(store.find_by_id(999).await.unwrap().is_none());
        assert!(store.find_by_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_enforces_uniqueness() {
        let store = InMemoryUserStore::new();
        store.create(new_user("alice", "a@x.com")).await.unwrap();

        let err = store
            .create(new_user("alice", "b@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.conflict_field(), Some(ConflictField::Username));

        let err = store
            .create(new_user("bob", "a@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err.conflict_field(), Some(ConflictField::Email));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_username() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("alice", "a@x.com")).await.unwrap();

        store.update_username(created.id, "alicia").await.unwrap();
        let reloaded = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.username, "alicia");
        assert!(reloaded.updated_at >= created.updated_at);

        let err = store.update_username(999, "ghost").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_username_conflict() {
        let store = InMemoryUserStore::new();
        let a = store.create(new_user("alice", "a@x.com")).await.unwrap();
        store.create(new_user("bob", "b@x.com")).await.unwrap();

        let err = store.update_username(a.id, "bob").await.unwrap_err();
        assert!(err.is_conflict());

        // Renaming to your own current name is not a conflict.
        store.update_username(a.id, "alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryUserStore::new();
        let created = store.create(new_user("alice", "a@x.com")).await.unwrap();

        store.delete(created.id).await.unwrap();
        assert!(store.find_by_id(created.id).await.unwrap().is_none());

        let err = store.delete(created.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_cache_set_get_delete() {
        let store = InMemoryUserStore::new();
        let cache = InMemoryUserCache::new();
        let user = store.create(new_user("alice", "a@x.com")).await.unwrap();

        assert!(cache.get(user.id).await.unwrap().is_none());

        cache.set(&user.profile()).await.unwrap();
        let hit = cache.get(user.id).await.unwrap().unwrap();
        assert_eq!(hit.username, "alice");

        cache.delete(user.id).await.unwrap();
        assert!(cache.get(user.id).await.unwrap().is_none());

        // Deleting an absent entry is fine.
        cache.delete(user.id).await.unwrap();
    }
}
