//! HTTP handlers for the user endpoints.
//!
//! Thin glue: validate the payload, call the consistency service, map its
//! outcome onto the API envelope. All business decisions live in
//! [`UserService`](super::service::UserService).

use std::sync::LazyLock;

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use regex::Regex;

use aegis_api::{ApiError, ApiResponse};
use aegis_auth::middleware::Authenticated;
use aegis_auth::password::hash_password;
use aegis_storage::NewUser;

use super::service::UserServiceError;
use super::types::{LoginRequest, LoginResponse, RegisterRequest, UpdateUsernameRequest};
use crate::state::AppState;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

const MAX_USERNAME_LEN: usize = 64;

fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(ApiError::bad_request("username must not be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request("username too long"));
    }
    Ok(())
}

/// Maps service outcomes shared by several handlers. Internal detail is
/// logged here and replaced with a generic message.
fn map_service_error(err: UserServiceError) -> ApiError {
    match err {
        UserServiceError::NotFound => ApiError::not_found("user not found"),
        UserServiceError::UsernameTaken => ApiError::UsernameExists,
        UserServiceError::EmailTaken => ApiError::EmailExists,
        UserServiceError::BadCredentials => ApiError::BadCredentials,
        internal => {
            tracing::error!(error = %internal, "user service failure");
            ApiError::internal(internal.to_string())
        }
    }
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;
    if !EMAIL_RE.is_match(&req.email) {
        return Err(ApiError::bad_request("invalid email address"));
    }
    if req.password.is_empty() {
        return Err(ApiError::bad_request("password must not be empty"));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::internal(e.to_string())
    })?;

    let profile = state
        .service
        .register(NewUser::new(req.username, req.email, password_hash))
        .await
        .map_err(map_service_error)?;

    Ok(ApiResponse::ok(profile))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("username and password are required"));
    }

    let profile = state
        .service
        .authenticate(&req.username, &req.password)
        .await
        .map_err(map_service_error)?;

    let token = state
        .auth
        .jwt_service
        .issue(profile.id, &profile.username)
        .map_err(|e| {
            tracing::error!(error = %e, "token issuance failed");
            ApiError::internal(e.to_string())
        })?;

    Ok(ApiResponse::ok(LoginResponse {
        token,
        user: profile,
    }))
}

/// GET /users/me
pub async fn me(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .service
        .get(claims.sub)
        .await
        .map_err(map_service_error)?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(ApiResponse::ok(profile))
}

/// PUT /users/me
pub async fn update_me(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
    Json(req): Json<UpdateUsernameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_username(&req.username)?;

    let profile = state
        .service
        .update_username(claims.sub, &req.username)
        .await
        .map_err(map_service_error)?;

    Ok(ApiResponse::ok(profile))
}

/// DELETE /users/me
pub async fn delete_me(
    State(state): State<AppState>,
    Authenticated(claims): Authenticated,
) -> Result<impl IntoResponse, ApiError> {
    state
        .service
        .delete(claims.sub)
        .await
        .map_err(map_service_error)?;

    Ok(ApiResponse::<()>::ok_empty())
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok(serde_json::json!({"status": "up"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_regex_accepts_plausible_addresses() {
        for email in ["a@b.co", "user.name+tag@example.org"] {
            assert!(EMAIL_RE.is_match(email), "{email}");
        }
    }

    #[test]
    fn test_email_regex_rejects_garbage() {
        for email in ["", "no-at-sign", "two@@example.com", "a b@example.com", "a@b"] {
            assert!(!EMAIL_RE.is_match(email), "{email}");
        }
    }

    #[test]
    fn test_username_validation() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username(&"x".repeat(65)).is_err());
    }
}
