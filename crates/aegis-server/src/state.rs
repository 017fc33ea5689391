//! Shared application state.

use std::sync::Arc;

use axum::extract::FromRef;

use aegis_auth::middleware::AuthState;

use crate::users::UserService;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// User consistency service.
    pub service: Arc<UserService>,
    /// Token verification state for the auth gate.
    pub auth: AuthState,
}

impl AppState {
    pub fn new(service: Arc<UserService>, auth: AuthState) -> Self {
        Self { service, auth }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
