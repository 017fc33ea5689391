//! Storage error types.
//!
//! This module defines all error types that can occur during record-store
//! operations. "Record absent" is signalled with `Option`, not an error;
//! `NotFound` here means an operation that requires an existing row (update,
//! delete) targeted a missing one.

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// The unique field a [`StorageError::Conflict`] is about.
///
/// Backends attribute the violated constraint themselves; callers branch on
/// this instead of parsing error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    /// The username unique constraint was violated.
    Username,
    /// The email unique constraint was violated.
    Email,
    /// The backend could not attribute the violation to a known field.
    Other,
}

/// Errors that can occur during record-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The targeted user record does not exist.
    #[error("User not found: {id}")]
    NotFound {
        /// The ID of the user that was not found.
        id: i64,
    },

    /// A uniqueness constraint was violated (username or email already taken).
    #[error("Conflict: {message}")]
    Conflict {
        /// Which unique field the violation is about.
        field: ConflictField,
        /// Description of the conflict, for logs only.
        message: String,
    },

    /// The storage backend failed.
    #[error("Database error: {message}")]
    Database {
        /// Description of the backend failure.
        message: String,
    },

    /// Serialization or deserialization of a stored record failed.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// An unexpected internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(id: i64) -> Self {
        Self::NotFound { id }
    }

    /// Creates a new `Conflict` error for the given field.
    #[must_use]
    pub fn conflict(field: ConflictField, message: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            message: message.into(),
        }
    }

    /// Creates a new `Database` error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
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

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a `Conflict` error.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// Returns the conflicting field, if this is a `Conflict` error.
    #[must_use]
    pub fn conflict_field(&self) -> Option<ConflictField> {
        match self {
            Self::Conflict { field, .. } => Some(*field),
            _ => None,
        }
    }

    /// Returns `true` if this is a backend failure (5xx category).
    #[must_use]
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            Self::Database { .. } | Self::Serialization { .. } | Self::Internal { .. }
        )
    }
}
