//! Authentication errors and their HTTP responses.
//!
//! Every authentication failure maps to the same generic 401 body. The
//! distinguishing detail (expired vs forged vs missing) is logged server-side
//! and never reaches the client.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::token::jwt::JwtError;

/// Errors produced by the authentication gate.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No usable `Authorization: Bearer` header was present.
    #[error("Missing bearer token")]
    MissingToken,

    /// The bearer token failed verification.
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Same body for every failure mode.
        tracing::debug!(error = %self, "authentication rejected");

        let body = json!({
            "ok": false,
            "code": "unauthorized",
            "message": "authentication required",
        });

        let mut response = (StatusCode::UNAUTHORIZED, Json(body)).into_response();
        response.headers_mut().insert(
            header::WWW_AUTHENTICATE,
            HeaderValue::from_static("Bearer"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_maps_to_401() {
        let response = AuthError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[test]
    fn test_expired_and_forged_tokens_get_identical_responses() {
        let expired = AuthError::InvalidToken(JwtError::Expired).into_response();
        let forged = AuthError::InvalidToken(JwtError::InvalidSignature).into_response();
        assert_eq!(expired.status(), forged.status());
    }
}
