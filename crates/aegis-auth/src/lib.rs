//! # aegis-auth
//!
//! Authentication primitives for the aegis server.
//!
//! This crate provides:
//! - RS256/RS384 JWT issuance and verification
//! - Typed token claims
//! - Argon2id password hashing
//! - An Axum extractor that gates handlers behind a valid bearer token
//!
//! ## Modules
//!
//! - [`claims`] - Typed JWT claims
//! - [`config`] - Authentication configuration
//! - [`error`] - Authentication errors and their HTTP responses
//! - [`middleware`] - HTTP extractor for bearer token authentication
//! - [`password`] - Password hashing and verification
//! - [`token`] - JWT encoding, decoding, and key management

pub mod claims;
pub mod config;
pub mod error;
pub mod middleware;
pub mod password;
pub mod token;

pub use claims::UserClaims;
pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{AuthState, Authenticated};
pub use password::{PasswordError, hash_password, verify_password};
pub use token::jwt::{JwtError, JwtService, SigningAlgorithm, SigningKeyPair};
