//! User consistency service.
//!
//! Coordinates the user store (source of truth) and the profile cache.
//! The protocol is cache-aside on read and write-through on mutation:
//!
//! - reads consult the cache first and repopulate it from the store on miss
//! - mutations hit the store first, then repopulate or invalidate the cache
//!
//! A cache backend failure on read is an error, not a miss: falling through
//! to the store would hide outages behind silently degraded latency and let
//! a flapping cache serve stale data after recovery. The store is never
//! consulted when the cache cannot answer.
//!
//! Registration uses sequential uniqueness checks, so two concurrent
//! registrations for the same name can both pass the check. The store's
//! unique constraint catches that window and surfaces as a conflict.

use std::sync::Arc;

use aegis_auth::password::verify_password;
use aegis_storage::{
    CacheError, ConflictField, NewUser, StorageError, UserCache, UserId, UserProfile, UserStore,
};

// =============================================================================
// Error Types
// =============================================================================

/// Outcomes of user service operations that are not plain success.
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// No live record for the requested user.
    #[error("User not found")]
    NotFound,

    /// The requested username is taken by another record.
    #[error("Username already exists")]
    UsernameTaken,

    /// The email is already registered.
    #[error("Email already exists")]
    EmailTaken,

    /// Password did not match during authentication.
    #[error("Bad credentials")]
    BadCredentials,

    /// The store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The cache backend failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Stored credential material is unusable.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl UserServiceError {
    /// Returns `true` for failures the client cannot fix by changing the
    /// request.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Cache(_) | Self::Internal(_)
        )
    }
}

// =============================================================================
// User Service
// =============================================================================

/// Orchestrates the user store and profile cache.
pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn UserCache>,
}

impl UserService {
    /// Creates a service over the given store and cache.
    pub fn new(store: Arc<dyn UserStore>, cache: Arc<dyn UserCache>) -> Self {
        Self { store, cache }
    }

    /// Fetches a user profile, cache first.
    ///
    /// A cache hit never touches the store. A miss repopulates the cache via
    /// [`refresh`](Self::refresh). `Ok(None)` means no live record exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache backend or the store fails. A cache
    /// backend failure does not fall through to the store.
    pub async fn get(&self, id: UserId) -> Result<Option<UserProfile>, UserServiceError> {
        if let Some(profile) = self.cache.get(id).await? {
            return Ok(Some(profile));
        }
        self.refresh(id).await
    }

    /// Reloads a profile from the store and writes it through to the cache.
    ///
    /// `Ok(None)` when the store has no live record; the cache is left
    /// untouched in that case.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read or the cache write fails.
    pub async fn refresh(&self, id: UserId) -> Result<Option<UserProfile>, UserServiceError> {
        let Some(user) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };
        let profile = user.profile();
        self.cache.set(&profile).await?;
        Ok(Some(profile))
    }

    /// Registers a new user from an already-hashed credential.
    ///
    /// Username and email are checked in that order so the caller can report
    /// which one collides. The cache is not primed; the first read does that.
    ///
    /// # Errors
    ///
    /// `UsernameTaken` / `EmailTaken` on collision (including the store's
    /// unique-constraint backstop), storage errors otherwise.
    pub async fn register(&self, user: NewUser) -> Result<UserProfile, UserServiceError> {
        if self.store.find_by_username(&user.username).await?.is_some() {
            return Err(UserServiceError::UsernameTaken);
        }
        if self.store.find_by_email(&user.email).await?.is_some() {
            return Err(UserServiceError::EmailTaken);
        }

        let created = match self.store.create(user).await {
            Ok(created) => created,
            // Concurrent registration slipped past the checks above. The
            // backend attributes the violated constraint; username is the
            // fallback for unattributed conflicts, matching check order.
            Err(e) if e.is_conflict() => {
                return Err(match e.conflict_field() {
                    Some(ConflictField::Email) => UserServiceError::EmailTaken,
                    _ => UserServiceError::UsernameTaken,
                });
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user.id = created.id, user.username = %created.username, "user registered");
        Ok(created.profile())
    }

    /// Renames a user, then refreshes the cache so the next read sees the
    /// new name.
    ///
    /// A failed store write leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` if the user does not exist, `UsernameTaken` if another
    /// record holds the name.
    pub async fn update_username(
        &self,
        id: UserId,
        username: &str,
    ) -> Result<UserProfile, UserServiceError> {
        match self.store.find_by_username(username).await? {
            Some(existing) if existing.id != id => {
                return Err(UserServiceError::UsernameTaken);
            }
            _ => {}
        }

        match self.store.update_username(id, username).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Err(UserServiceError::NotFound),
            Err(e) if e.is_conflict() => return Err(UserServiceError::UsernameTaken),
            Err(e) => return Err(e.into()),
        }

        // Store write landed; repopulate so the cache cannot serve the old
        // name.
        match self.refresh(id).await? {
            Some(profile) => Ok(profile),
            None => Err(UserServiceError::NotFound),
        }
    }

    /// Deletes a user: store first, then cache invalidation.
    ///
    /// If the cache delete fails it is retried once. A second failure is an
    /// error even though the store row is already gone, so the caller knows
    /// a stale profile may still be served until the entry is removed.
    ///
    /// # Errors
    ///
    /// `NotFound` if no live record exists; storage or cache errors
    /// otherwise.
    pub async fn delete(&self, id: UserId) -> Result<(), UserServiceError> {
        match self.store.delete(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Err(UserServiceError::NotFound),
            Err(e) => return Err(e.into()),
        }

        if let Err(first) = self.cache.delete(id).await {
            tracing::warn!(user.id = id, error = %first, "cache delete failed, retrying");
            self.cache.delete(id).await?;
        }

        tracing::info!(user.id = id, "user deleted");
        Ok(())
    }

    /// Verifies a username/password pair.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown username, `BadCredentials` for a wrong
    /// password. An unparseable stored hash is internal, never a mismatch.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserProfile, UserServiceError> {
        let Some(user) = self.store.find_by_username(username).await? else {
            return Err(UserServiceError::NotFound);
        };

        let matches = verify_password(password, &user.password_hash)
            .map_err(|e| UserServiceError::Internal(e.to_string()))?;
        if !matches {
            return Err(UserServiceError::BadCredentials);
        }

        Ok(user.profile())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_auth::password::hash_password;
    use aegis_storage::{InMemoryUserCache, InMemoryUserStore, StorageResult, User};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wrapper that counts store reads, to prove cache hits bypass it.
    struct CountingStore {
        inner: InMemoryUserStore,
        reads: AtomicUsize,
    }

    impl CountingStore {
        fn new() -> Self {
            Self {
                inner: InMemoryUserStore::new(),
                reads: AtomicUsize::new(0),
            }
        }

        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UserStore for CountingStore {
        async fn find_by_id(&self, id: UserId) -> StorageResult<Option<User>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }
        async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
            self.inner.find_by_username(username).await
        }
        async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
            self.inner.find_by_email(email).await
        }
        async fn create(&self, user: NewUser) -> StorageResult<User> {
            self.inner.create(user).await
        }
        async fn update_username(&self, id: UserId, username: &str) -> StorageResult<()> {
            self.inner.update_username(id, username).await
        }
        async fn delete(&self, id: UserId) -> StorageResult<()> {
            self.inner.delete(id).await
        }
    }

    /// Store double where both uniqueness pre-checks pass but create hits a
    /// unique constraint, as when a concurrent registration wins the race.
    struct RacyStore {
        conflict: ConflictField,
    }

    #[async_trait]
    impl UserStore for RacyStore {
        async fn find_by_id(&self, _id: UserId) -> StorageResult<Option<User>> {
            Ok(None)
        }
        async fn find_by_username(&self, _username: &str) -> StorageResult<Option<User>> {
            Ok(None)
        }
        async fn find_by_email(&self, _email: &str) -> StorageResult<Option<User>> {
            Ok(None)
        }
        async fn create(&self, user: NewUser) -> StorageResult<User> {
            Err(StorageError::conflict(
                self.conflict,
                format!("username '{}' already exists", user.username),
            ))
        }
        async fn update_username(&self, _id: UserId, _username: &str) -> StorageResult<()> {
            Ok(())
        }
        async fn delete(&self, _id: UserId) -> StorageResult<()> {
            Ok(())
        }
    }

    /// Cache double whose backend is down.
    struct FailingCache;

    #[async_trait]
    impl UserCache for FailingCache {
        async fn get(&self, _id: UserId) -> Result<Option<UserProfile>, CacheError> {
            Err(CacheError::backend("connection refused"))
        }
        async fn set(&self, _profile: &UserProfile) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }
        async fn delete(&self, _id: UserId) -> Result<(), CacheError> {
            Err(CacheError::backend("connection refused"))
        }
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser::new(name, email, hash_password("hunter2").unwrap())
    }

    fn service_with_counting_store() -> (Arc<CountingStore>, UserService) {
        let store = Arc::new(CountingStore::new());
        let cache = Arc::new(InMemoryUserCache::new());
        let service = UserService::new(store.clone(), cache);
        (store, service)
    }

    fn service() -> UserService {
        UserService::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryUserCache::new()),
        )
    }

    #[tokio::test]
    async fn test_get_after_refresh_skips_the_store() {
        let (store, service) = service_with_counting_store();
        let created = service
            .register(new_user("alice", "a@x.com"))
            .await
            .unwrap();

        service.refresh(created.id).await.unwrap().unwrap();
        let reads_after_refresh = store.reads();

        let profile = service.get(created.id).await.unwrap().unwrap();
        assert_eq!(profile.username, "alice");
        assert_eq!(store.reads(), reads_after_refresh);
    }

    #[tokio::test]
    async fn test_get_miss_populates_cache() {
        let (store, service) = service_with_counting_store();
        let created = service
            .register(new_user("alice", "a@x.com"))
            .await
            .unwrap();

        // First get misses and reads the store.
        service.get(created.id).await.unwrap().unwrap();
        let reads = store.reads();

        // Second get is served from cache.
        service.get(created.id).await.unwrap().unwrap();
        assert_eq!(store.reads(), reads);
    }

    #[tokio::test]
    async fn test_get_unknown_user_is_none() {
        let service = service();
        assert!(service.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_backend_error_does_not_fall_through() {
        let store = Arc::new(CountingStore::new());
        let service = UserService::new(store.clone(), Arc::new(FailingCache));

        let err = service.get(1).await.unwrap_err();
        assert!(matches!(err, UserServiceError::Cache(_)));
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected_without_a_new_record() {
        let service = service();
        service.register(new_user("alice", "a@x.com")).await.unwrap();

        let err = service
            .register(new_user("alice", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::UsernameTaken));
        assert!(service
            .store
            .find_by_email("other@x.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let service = service();
        service.register(new_user("alice", "a@x.com")).await.unwrap();

        let err = service
            .register(new_user("bob", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::EmailTaken));
    }

    #[tokio::test]
    async fn test_username_conflict_backstop_ignores_message_text() {
        // The conflict message mentions the username "email_fan"; the outcome
        // must still follow the attributed field, not the text.
        let service = UserService::new(
            Arc::new(RacyStore {
                conflict: ConflictField::Username,
            }),
            Arc::new(InMemoryUserCache::new()),
        );

        let err = service
            .register(new_user("email_fan", "fan@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_email_conflict_backstop_reports_email_taken() {
        let service = UserService::new(
            Arc::new(RacyStore {
                conflict: ConflictField::Email,
            }),
            Arc::new(InMemoryUserCache::new()),
        );

        let err = service
            .register(new_user("bob", "a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::EmailTaken));
    }

    #[tokio::test]
    async fn test_update_username_is_visible_on_next_get() {
        let service = service();
        let created = service
            .register(new_user("alice", "a@x.com"))
            .await
            .unwrap();
        service.get(created.id).await.unwrap();

        service.update_username(created.id, "alicia").await.unwrap();

        let profile = service.get(created.id).await.unwrap().unwrap();
        assert_eq!(profile.username, "alicia");
    }

    #[tokio::test]
    async fn test_update_username_to_taken_name_fails() {
        let service = service();
        let alice = service
            .register(new_user("alice", "a@x.com"))
            .await
            .unwrap();
        service.register(new_user("bob", "b@x.com")).await.unwrap();

        let err = service.update_username(alice.id, "bob").await.unwrap_err();
        assert!(matches!(err, UserServiceError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let service = service();
        let err = service.update_username(999, "ghost").await.unwrap_err();
        assert!(matches!(err, UserServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_cache_entry() {
        let service = service();
        let created = service
            .register(new_user("alice", "a@x.com"))
            .await
            .unwrap();
        service.get(created.id).await.unwrap();

        service.delete(created.id).await.unwrap();

        assert!(service.get(created.id).await.unwrap().is_none());
        assert!(service.refresh(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let service = service();
        let err = service.delete(999).await.unwrap_err();
        assert!(matches!(err, UserServiceError::NotFound));
    }

    #[tokio::test]
    async fn test_authenticate_happy_path() {
        let service = service();
        service.register(new_user("alice", "a@x.com")).await.unwrap();

        let profile = service.authenticate("alice", "hunter2").await.unwrap();
        assert_eq!(profile.username, "alice");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let service = service();
        service.register(new_user("alice", "a@x.com")).await.unwrap();

        let err = service.authenticate("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, UserServiceError::BadCredentials));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_username() {
        let service = service();
        let err = service.authenticate("nobody", "hunter2").await.unwrap_err();
        assert!(matches!(err, UserServiceError::NotFound));
    }
}
