//! Bearer token authentication extractor.
//!
//! Provides an Axum extractor that validates the `Authorization: Bearer`
//! header and hands verified claims to the handler. The extractor is pure
//! with respect to storage: it decides solely from the token, without any
//! database or cache lookup.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use aegis_auth::middleware::{AuthState, Authenticated};
//!
//! async fn protected_handler(Authenticated(claims): Authenticated) -> String {
//!     format!("Hello, {}!", claims.username)
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::claims::UserClaims;
use crate::error::AuthError;
use crate::token::jwt::JwtService;

// =============================================================================
// Auth State
// =============================================================================

/// State required for bearer token authentication.
///
/// Include this in your application state and make it available to the
/// `Authenticated` extractor via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(jwt_service: Arc<JwtService>) -> Self {
        Self { jwt_service }
    }
}

// =============================================================================
// Authenticated Extractor
// =============================================================================

/// Axum extractor that validates a Bearer token and yields its claims.
///
/// This extractor:
/// 1. Extracts the `Authorization: Bearer <token>` header
/// 2. Verifies the JWT (header algorithm, signature, expiry, issuer)
/// 3. Hands the typed claims to the handler
///
/// # Errors
///
/// Returns [`AuthError`] (which implements `IntoResponse` as a uniform 401)
/// if the header is missing or malformed, or the token fails verification.
#[derive(Debug)]
pub struct Authenticated(pub UserClaims);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = auth_state.jwt_service.verify(token)?;
        Ok(Self(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::jwt::{SigningAlgorithm, SigningKeyPair};
    use axum::http::Request;
    use time::Duration;

    fn auth_state() -> AuthState {
        let key_pair = SigningKeyPair::generate_rsa(SigningAlgorithm::RS256).unwrap();
        let service = JwtService::new(key_pair, "aegis-test", Duration::hours(1));
        AuthState::new(Arc::new(service))
    }

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/users/me");
        if let Some(v) = value {
            builder = builder.header(AUTHORIZATION, v);
        }
        let (parts, ()) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_valid_token_yields_claims() {
        let state = auth_state();
        let token = state.jwt_service.issue(42, "alice").unwrap();
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));

        let Authenticated(claims) = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let state = auth_state();
        let mut parts = parts_with_header(None);

        let err = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_rejected() {
        let state = auth_state();
        let mut parts = parts_with_header(Some("Basic YWxpY2U6aHVudGVyMg=="));

        let err = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingToken));
    }

    #[tokio::test]
    async fn test_garbage_token_is_rejected() {
        let state = auth_state();
        let mut parts = parts_with_header(Some("Bearer garbage"));

        let err = Authenticated::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(_)));
    }
}
