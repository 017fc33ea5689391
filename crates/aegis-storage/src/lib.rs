//! Storage abstractions for the Aegis user-management backend.
//!
//! This crate defines the user record model, the durable record-store trait,
//! the user-record cache trait, and in-memory implementations of both. The
//! PostgreSQL backend lives in `aegis-postgres`; the Redis-backed cache lives
//! in the server crate.

pub mod cache;
pub mod error;
pub mod memory;
pub mod user;

pub use cache::{CacheError, UserCache};
pub use error::{ConflictField, StorageError, StorageResult};
pub use memory::{InMemoryUserCache, InMemoryUserStore};
pub use user::{NewUser, User, UserId, UserProfile, UserStore};
