//! # aegis-server
//!
//! HTTP server for the aegis user-management service.
//!
//! Endpoints:
//! - `POST /auth/register` - create an account
//! - `POST /auth/login` - exchange credentials for a signed token
//! - `GET /users/me` - fetch the authenticated user's profile
//! - `PUT /users/me` - change the authenticated user's username
//! - `DELETE /users/me` - delete the authenticated user's account
//! - `GET /healthz` - liveness probe
//!
//! Profiles are served through a read-through cache over the user store;
//! see [`users::UserService`] for the consistency protocol.

pub mod cache;
pub mod config;
pub mod observability;
pub mod server;
pub mod state;
pub mod users;

pub use server::{AegisServer, ServerBuilder, build_app, build_state};
