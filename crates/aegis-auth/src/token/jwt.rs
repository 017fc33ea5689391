//! JWT token generation and validation.
//!
//! Tokens are signed with asymmetric RSA keys (RS256 or RS384). Before a
//! token reaches `jsonwebtoken`, the header's `alg` field is inspected
//! directly: a token claiming any algorithm other than the service's
//! configured one (including `none`) is rejected as an algorithm mismatch,
//! never verified against the wrong key type.
//!
//! ## Example
//!
//! ```ignore
//! use aegis_auth::token::jwt::{JwtService, SigningAlgorithm, SigningKeyPair};
//! use time::Duration;
//!
//! let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256)?;
//! let service = JwtService::new(key_pair, "aegis", Duration::hours(24));
//!
//! let token = service.issue(user.id, &user.username)?;
//! let claims = service.verify(&token)?;
//! ```

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::claims::UserClaims;

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur during JWT operations.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to encode a token.
    #[error("Failed to encode token: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// The token is not structurally a JWT.
    #[error("Malformed token: {message}")]
    Malformed {
        /// Description of the parse failure.
        message: String,
    },

    /// The token header names an algorithm other than the configured one.
    #[error("Algorithm mismatch: expected {expected}, found {found}")]
    AlgorithmMismatch {
        /// The algorithm this service signs with.
        expected: String,
        /// The algorithm claimed by the token header.
        found: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token signature is invalid.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token claims are invalid.
    #[error("Invalid claims: {message}")]
    InvalidClaims {
        /// Description of why claims are invalid.
        message: String,
    },

    /// Failed to generate a cryptographic key.
    #[error("Key generation error: {message}")]
    KeyGenerationError {
        /// Description of the key generation error.
        message: String,
    },

    /// Invalid key format or data.
    #[error("Invalid key: {message}")]
    InvalidKey {
        /// Description of why the key is invalid.
        message: String,
    },
}

impl JwtError {
    /// Creates a new `EncodingError`.
    #[must_use]
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Creates a new `Malformed` error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates a new `AlgorithmMismatch` error.
    #[must_use]
    pub fn algorithm_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::AlgorithmMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a new `InvalidClaims` error.
    #[must_use]
    pub fn invalid_claims(message: impl Into<String>) -> Self {
        Self::InvalidClaims {
            message: message.into(),
        }
    }

    /// Creates a new `KeyGenerationError`.
    #[must_use]
    pub fn key_generation_error(message: impl Into<String>) -> Self {
        Self::KeyGenerationError {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidKey` error.
    #[must_use]
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error rather than a key or
    /// encoding problem.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            Self::Expired
                | Self::InvalidSignature
                | Self::Malformed { .. }
                | Self::AlgorithmMismatch { .. }
                | Self::InvalidClaims { .. }
        )
    }
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                Self::malformed(err.to_string())
            }
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidSubject
            | ErrorKind::MissingRequiredClaim(_) => Self::invalid_claims(err.to_string()),
            ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                Self::invalid_key(err.to_string())
            }
            _ => Self::malformed(err.to_string()),
        }
    }
}

// ============================================================================
// Signing Algorithm
// ============================================================================

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningAlgorithm {
    /// RSA with SHA-256.
    RS256,
    /// RSA with SHA-384.
    RS384,
}

impl SigningAlgorithm {
    /// Converts to the `jsonwebtoken` Algorithm type.
    #[must_use]
    pub fn to_jwt_algorithm(self) -> Algorithm {
        match self {
            Self::RS256 => Algorithm::RS256,
            Self::RS384 => Algorithm::RS384,
        }
    }

    /// Returns the algorithm name as used in JWT headers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Signing Key Pair
// ============================================================================

/// A signing key pair for JWT operations.
pub struct SigningKeyPair {
    /// Key ID.
    pub kid: String,

    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,

    /// Encoding key (private key) for signing.
    encoding_key: EncodingKey,

    /// Decoding key (public key) for verification.
    decoding_key: DecodingKey,
}

impl SigningKeyPair {
    /// Generates a new RSA key pair.
    ///
    /// # Errors
    /// Returns an error if key generation fails.
    pub fn generate_rsa(algorithm: SigningAlgorithm) -> Result<Self, JwtError> {
        let bits = 2048;
        let private_key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let private_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        let public_key = RsaPublicKey::from(&private_key);
        let public_pem = {
            use rsa::pkcs8::EncodePublicKey;
            public_key
                .to_public_key_pem(LineEnding::LF)
                .map_err(|e| JwtError::key_generation_error(e.to_string()))?
        };

        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::key_generation_error(e.to_string()))?;

        Ok(Self {
            kid: uuid::Uuid::new_v4().to_string(),
            algorithm,
            encoding_key,
            decoding_key,
        })
    }

    /// Loads a key pair from PEM strings.
    ///
    /// # Errors
    /// Returns an error if the PEM data is invalid.
    pub fn from_pem(
        kid: impl Into<String>,
        algorithm: SigningAlgorithm,
        private_pem: &str,
        public_pem: &str,
    ) -> Result<Self, JwtError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| JwtError::invalid_key(e.to_string()))?;

        Ok(Self {
            kid: kid.into(),
            algorithm,
            encoding_key,
            decoding_key,
        })
    }
}

// ============================================================================
// JWT Service
// ============================================================================

/// Header fields inspected before signature verification.
#[derive(Debug, Deserialize)]
struct RawHeader {
    alg: String,
}

/// Service for issuing and verifying access tokens.
///
/// Thread-safe (`Send + Sync`), shared across async tasks behind an `Arc`.
pub struct JwtService {
    signing_key: SigningKeyPair,
    issuer: String,
    token_lifetime: Duration,
}

impl JwtService {
    /// Creates a new JWT service.
    #[must_use]
    pub fn new(
        signing_key: SigningKeyPair,
        issuer: impl Into<String>,
        token_lifetime: Duration,
    ) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
            token_lifetime,
        }
    }

    /// Issues a signed access token for a user.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn issue(&self, user_id: i64, username: &str) -> Result<String, JwtError> {
        let claims = UserClaims::new(&self.issuer, user_id, username, self.token_lifetime);
        self.encode(&claims)
    }

    /// Encodes arbitrary claims into a signed JWT string.
    ///
    /// # Errors
    /// Returns an error if encoding fails.
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let mut header = Header::new(self.signing_key.algorithm.to_jwt_algorithm());
        header.kid = Some(self.signing_key.kid.clone());

        encode(&header, claims, &self.signing_key.encoding_key)
            .map_err(|e| JwtError::encoding_error(e.to_string()))
    }

    /// Verifies a token and returns its claims.
    ///
    /// The header's `alg` field is checked against the configured algorithm
    /// before any cryptographic work; a token claiming `none` or an HMAC
    /// algorithm fails with [`JwtError::AlgorithmMismatch`].
    ///
    /// # Errors
    /// Returns an error if the token is malformed, carries the wrong
    /// algorithm, is expired, or fails signature validation.
    pub fn verify(&self, token: &str) -> Result<UserClaims, JwtError> {
        self.check_header_algorithm(token)?;

        let mut validation = Validation::new(self.signing_key.algorithm.to_jwt_algorithm());
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let data = decode::<UserClaims>(token, &self.signing_key.decoding_key, &validation)?;
        Ok(data.claims)
    }

    /// Returns the current signing key ID.
    #[must_use]
    pub fn current_kid(&self) -> &str {
        &self.signing_key.kid
    }

    /// Returns the issuer value stamped into tokens.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the configured token lifetime.
    #[must_use]
    pub fn token_lifetime(&self) -> Duration {
        self.token_lifetime
    }

    fn check_header_algorithm(&self, token: &str) -> Result<(), JwtError> {
        let header_segment = token
            .split('.')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| JwtError::malformed("empty token"))?;

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_segment)
            .map_err(|e| JwtError::malformed(format!("header is not base64url: {e}")))?;

        let header: RawHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| JwtError::malformed(format!("header is not valid JSON: {e}")))?;

        let expected = self.signing_key.algorithm.as_str();
        if header.alg != expected {
            return Err(JwtError::algorithm_mismatch(expected, header.alg));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
