//! Token generation and validation.

pub mod jwt;

pub use jwt::{JwtError, JwtService, SigningAlgorithm, SigningKeyPair};
