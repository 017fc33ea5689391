//! HTTP response envelope and API error types for the Aegis server.
//!
//! Every endpoint answers with the same JSON shape: `{ ok, code, message,
//! data? }`. [`ApiError`] maps domain outcomes onto status codes and stable
//! machine-readable codes; internal failures never leak backend text.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// -------------------------
// Response Envelope
// -------------------------

/// Uniform JSON envelope for every API response.
///
/// Success and failure share the same shape so clients can branch on `ok`
/// (or the HTTP status) without sniffing the body structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub ok: bool,
    /// Machine-readable result code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Builds a success envelope with a payload.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            code: "ok".to_string(),
            message: "success".to_string(),
            data: Some(data),
        }
    }

    /// Builds a success envelope with no payload.
    pub fn ok_empty() -> Self {
        Self {
            ok: true,
            code: "ok".to_string(),
            message: "success".to_string(),
            data: None,
        }
    }

    /// Builds a failure envelope.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

// -------------------------
// API Errors
// -------------------------

/// High-level API errors mapped to HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request payload failed validation.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials did not match during login.
    #[error("Bad credentials")]
    BadCredentials,

    /// Missing or invalid bearer token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested username is already taken.
    #[error("Username already exists")]
    UsernameExists,

    /// The requested email is already registered.
    #[error("Email already exists")]
    EmailExists,

    /// Something failed server-side. The detail is logged, never sent.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::BadCredentials | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UsernameExists | ApiError::EmailExists => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the envelope.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "params-invalid",
            ApiError::BadCredentials => "bad-password",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not-found",
            ApiError::UsernameExists => "username-exists",
            ApiError::EmailExists => "email-exists",
            ApiError::Internal(_) => "internal",
        }
    }

    /// Message carried in the envelope. Internal detail is replaced with a
    /// generic message.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = ApiResponse::<()>::error(self.code(), self.public_message());
        (self.status_code(), Json(envelope)).into_response()
    }
}
