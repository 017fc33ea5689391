//! Request and response payloads for the user endpoints.

use serde::{Deserialize, Serialize};

use aegis_storage::UserProfile;

/// POST /auth/register request body.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// POST /auth/login request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// PUT /users/me request body.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateUsernameRequest {
    pub username: String,
}

/// POST /auth/login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}
