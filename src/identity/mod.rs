//! Identity provider boundary.
//!
//! The provider owns authentication and organization membership. This
//! module defines the calls the access core makes against it, the wire
//! models it returns, and the structural token decoder.

pub mod client;
pub mod token;

use serde::{Deserialize, Serialize};

/// SSO profile returned for an SSO-issued access token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// User-management record, looked up by user id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture_url: Option<String>,
}

/// Result of a refresh-token exchange.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefreshedTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// Role attached to an organization membership.
///
/// The provider sends either a bare role name or an object carrying some
/// of `slug`, `name` and `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MembershipRole {
    Name(String),
    Structured {
        #[serde(default)]
        slug: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        id: Option<String>,
    },
}

impl MembershipRole {
    /// Single string form of the role: the name itself, or the first
    /// non-empty of `slug`, `name`, `id`; empty when none is set.
    pub fn normalized(&self) -> String {
        match self {
            MembershipRole::Name(name) => name.clone(),
            MembershipRole::Structured { slug, name, id } => [slug, name, id]
                .into_iter()
                .flatten()
                .find(|v| !v.is_empty())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// Normalize an optional role; an absent role is the empty string.
pub fn normalize_role(role: Option<&MembershipRole>) -> String {
    role.map(MembershipRole::normalized).unwrap_or_default()
}

/// Raw organization membership as listed by the provider.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Membership {
    #[serde(default)]
    pub id: Option<String>,
    pub organization_id: String,
    #[serde(default)]
    pub role: Option<MembershipRole>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

/// Calls the access core makes against the identity provider.
///
/// Each call may fail; callers decide the fallback.
pub trait IdentityProvider: Send + Sync {
    /// Look up the SSO profile that owns `access_token`.
    fn sso_get_profile(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<Profile, ProviderError>> + Send;

    /// Fetch a user-management record by id.
    fn get_user(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<UserRecord, ProviderError>> + Send;

    /// Exchange a refresh token for a new access token.
    fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<RefreshedTokens, ProviderError>> + Send;

    /// List every organization membership of `user_id`.
    fn list_memberships(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Membership>, ProviderError>> + Send;

    fn get_organization(
        &self,
        organization_id: &str,
    ) -> impl std::future::Future<Output = Result<Organization, ProviderError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("provider returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("unexpected provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// `not_found`-class errors (`not_found`, `entity_not_found`, ...).
    pub fn is_not_found(&self) -> bool {
        match self {
            ProviderError::NotFound(_) => true,
            ProviderError::Api { status, code, .. } => *status == 404 || code.ends_with("not_found"),
            _ => false,
        }
    }
}
