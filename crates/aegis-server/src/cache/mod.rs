//! Cache tiers backing the user consistency service.

pub mod backend;
pub mod user;

pub use backend::CacheBackend;
pub use user::UserProfileCache;
