//! HTTP middleware for authentication.

pub mod auth;

pub use auth::{AuthState, Authenticated};
