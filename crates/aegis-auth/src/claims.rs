//! Typed JWT claims.
//!
//! Claims are a concrete struct rather than a loose map, so a token that
//! verifies always carries a numeric user ID and a username. Missing or
//! wrongly-typed claims fail at decode time instead of surfacing as casts
//! deep inside a handler.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// Claims carried by an aegis access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserClaims {
    /// Issuer.
    pub iss: String,

    /// Subject: the user's numeric ID.
    pub sub: i64,

    /// Username at issue time. Informational only; the profile endpoint is
    /// the source of truth after a rename.
    pub username: String,

    /// Issued at (Unix timestamp).
    pub iat: i64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

impl UserClaims {
    /// Creates claims for a user, expiring `lifetime` from now.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        user_id: i64,
        username: impl Into<String>,
        lifetime: Duration,
    ) -> Self {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        Self {
            iss: issuer.into(),
            sub: user_id,
            username: username.into(),
            iat: now,
            exp: now + lifetime.whole_seconds(),
        }
    }

    /// Returns the user ID this token was issued for.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.sub
    }
}
