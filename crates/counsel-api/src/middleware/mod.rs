pub mod auth;
pub mod logging;

pub use auth::{require_auth, AuthUser};
