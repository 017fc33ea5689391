//! User storage.
//!
//! Persists user accounts in a `users` table with unique indexes on
//! username and email. Soft deletes keep the row for auditing while hiding
//! it from every read path.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;

use aegis_storage::{NewUser, StorageError, StorageResult, User, UserId, UserStore};

use crate::{PgPool, map_sqlx_error};

/// Database row tuple for a user record.
type UserTuple = (i64, String, String, String, OffsetDateTime, OffsetDateTime);

fn user_from_tuple(row: UserTuple) -> User {
    User {
        id: row.0,
        username: row.1,
        email: row.2,
        password_hash: row.3,
        created_at: row.4,
        updated_at: row.5,
    }
}

// =============================================================================
// Postgres User Store
// =============================================================================

/// PostgreSQL-backed user store.
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    /// Create a store with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a store by connecting to the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        use sqlx_core::pool::PoolOptions;
        use sqlx_postgres::Postgres;

        let pool = PoolOptions::<Postgres>::new()
            .connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `users` table and its indexes if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL statement fails.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        // One statement per execute, prepared statements reject batches.
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id            BIGSERIAL PRIMARY KEY,
                username      TEXT        NOT NULL,
                email         TEXT        NOT NULL,
                password_hash TEXT        NOT NULL,
                created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                deleted_at    TIMESTAMPTZ
            )
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS users_username_idx
                ON users (username) WHERE deleted_at IS NULL
            "#,
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS users_email_idx
                ON users (email) WHERE deleted_at IS NULL
            "#,
        ];

        for sql in statements {
            query(sql)
                .execute(self.pool.as_ref())
                .await
                .map_err(map_sqlx_error)?;
        }

        Ok(())
    }

    async fn find_one(&self, sql: &str, bind: &str) -> StorageResult<Option<User>> {
        let row: Option<UserTuple> = query_as(sql)
            .bind(bind)
            .fetch_optional(self.pool.as_ref())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(user_from_tuple))
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_id(&self, id: UserId) -> StorageResult<Option<User>> {
        let row: Option<UserTuple> = query_as(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
              AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(user_from_tuple))
    }

    async fn find_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        self.find_one(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
              AND deleted_at IS NULL
            "#,
            username,
        )
        .await
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.find_one(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
              AND deleted_at IS NULL
            "#,
            email,
        )
        .await
    }

    async fn create(&self, user: NewUser) -> StorageResult<User> {
        let row: UserTuple = query_as(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        Ok(user_from_tuple(row))
    }

    async fn update_username(&self, id: UserId, username: &str) -> StorageResult<()> {
        let result = query(
            r#"
            UPDATE users
            SET username = $2, updated_at = NOW()
            WHERE id = $1
              AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(username)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(id));
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> StorageResult<()> {
        let result = query(
            r#"
            UPDATE users
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1
              AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(id));
        }
        Ok(())
    }
}
