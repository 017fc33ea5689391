//! User accounts: consistency service, HTTP handlers, request types.

pub mod handlers;
pub mod service;
pub mod types;

pub use service::{UserService, UserServiceError};
