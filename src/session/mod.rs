// Public API - what other modules can use
pub use auth::AuthService;
pub use middleware::{require_auth, AuthenticatedAccount};
pub use service::SessionTokenStore;

mod auth;
pub mod generators;
mod middleware;
pub mod models;
pub mod repository;
pub mod service;

/// Shortened token for log output; full tokens are credentials
pub(crate) fn token_prefix(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
