//! Authentication configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::token::jwt::{JwtError, JwtService, SigningAlgorithm, SigningKeyPair};

/// Configuration for token issuance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer stamped into tokens and required at verification.
    pub issuer: String,

    /// How long issued tokens stay valid.
    #[serde(with = "humantime_serde")]
    pub token_lifetime: std::time::Duration,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// PEM-encoded private key. When unset, an ephemeral key pair is
    /// generated at startup and tokens do not survive a restart.
    pub private_key_path: Option<PathBuf>,

    /// PEM-encoded public key, required alongside `private_key_path`.
    pub public_key_path: Option<PathBuf>,

    /// Key ID for tokens signed with a key loaded from disk.
    pub key_id: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "aegis".to_string(),
            token_lifetime: std::time::Duration::from_secs(24 * 60 * 60),
            algorithm: SigningAlgorithm::RS256,
            private_key_path: None,
            public_key_path: None,
            key_id: None,
        }
    }
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns a message describing the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.issuer.is_empty() {
            return Err("auth.issuer must not be empty".to_string());
        }
        if self.token_lifetime.as_secs() == 0 {
            return Err("auth.token_lifetime must be positive".to_string());
        }
        if self.private_key_path.is_some() != self.public_key_path.is_some() {
            return Err(
                "auth.private_key_path and auth.public_key_path must be set together".to_string(),
            );
        }
        Ok(())
    }

    /// Builds a [`JwtService`] from this configuration.
    ///
    /// Loads the key pair from disk when paths are configured, otherwise
    /// generates an ephemeral one.
    ///
    /// # Errors
    ///
    /// Returns an error if the key files cannot be read or parsed, or if
    /// key generation fails.
    pub fn build_service(&self) -> Result<JwtService, JwtError> {
        let key_pair = match (&self.private_key_path, &self.public_key_path) {
            (Some(private_path), Some(public_path)) => {
                let private_pem = std::fs::read_to_string(private_path).map_err(|e| {
                    JwtError::invalid_key(format!("{}: {e}", private_path.display()))
                })?;
                let public_pem = std::fs::read_to_string(public_path).map_err(|e| {
                    JwtError::invalid_key(format!("{}: {e}", public_path.display()))
                })?;
                let kid = self
                    .key_id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                SigningKeyPair::from_pem(kid, self.algorithm, &private_pem, &public_pem)?
            }
            _ => SigningKeyPair::generate_rsa(self.algorithm)?,
        };

        let lifetime = time::Duration::seconds(self.token_lifetime.as_secs() as i64);
        Ok(JwtService::new(key_pair, &self.issuer, lifetime))
    }
}
