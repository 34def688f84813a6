//! Per-request session resolution.
//!
//! Credentials come from the request (cookies); the session is derived
//! from them on every request and never stored server-side.

pub mod credentials;
pub mod refresh;
pub mod resolver;

use serde::Serialize;

/// Credential holding the bearer access token.
pub const ACCESS_TOKEN: &str = "access-token";
/// Credential holding the refresh token.
pub const REFRESH_TOKEN: &str = "refresh-token";

/// Request-scoped credential lookup.
pub trait CredentialStore: Send + Sync {
    /// Value of credential `name`, if present.
    fn get(&self, name: &str) -> Option<String>;
}

/// Authenticated user.
///
/// Optional profile fields stay `None` when the provider omits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: SessionUser,
    pub access_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,
}
