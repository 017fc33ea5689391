//! PostgreSQL storage backend for aegis.
//!
//! Implements the [`aegis_storage::UserStore`] trait on top of a `users`
//! table. Deletes are soft: rows are stamped with `deleted_at` and every
//! read filters them out.
//!
//! # Example
//!
//! ```ignore
//! use aegis_postgres::PostgresUserStore;
//!
//! let store = PostgresUserStore::connect("postgres://localhost/aegis").await?;
//! store.ensure_schema().await?;
//! let user = store.find_by_username("alice").await?;
//! ```

pub mod user;

use aegis_storage::{ConflictField, StorageError};
use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

pub use user::PostgresUserStore;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

/// SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

/// Unique index names from `ensure_schema`, used to attribute conflicts.
const USERNAME_INDEX: &str = "users_username_idx";
const EMAIL_INDEX: &str = "users_email_idx";

/// Map a sqlx error onto the storage error model.
///
/// Unique-index violations become [`StorageError::Conflict`] with the field
/// attributed from the violated constraint name, so callers never inspect
/// SQLSTATE codes or error text themselves. Everything else is an opaque
/// database failure.
pub(crate) fn map_sqlx_error(err: sqlx_core::Error) -> StorageError {
    if let sqlx_core::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            let field = match db_err.constraint() {
                Some(USERNAME_INDEX) => ConflictField::Username,
                Some(EMAIL_INDEX) => ConflictField::Email,
                _ => ConflictField::Other,
            };
            return StorageError::conflict(field, db_err.message().to_string());
        }
    }
    StorageError::database(err.to_string())
}
