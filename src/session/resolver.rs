//! Bearer token → session user.
//!
//! Identity sources are tried in order and the first success wins:
//!
//! 1. `SsoProfile`: ask the provider for the profile owning the token.
//! 2. `UserManagement`: decode the token, reject it when `sub` is
//!    missing or `exp` is in the past, then fetch the user record by id.
//!
//! Every failure folds into "no session"; nothing propagates to the
//! request.

use super::{ACCESS_TOKEN, AuthError, CredentialStore, Session, SessionUser};
use crate::identity::token::{self, TokenError};
use crate::identity::{IdentityProvider, Profile, ProviderError, UserRecord};
use crate::ocsf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    SsoProfile,
    UserManagement,
}

impl IdentitySource {
    fn name(self) -> &'static str {
        match self {
            IdentitySource::SsoProfile => "sso_profile",
            IdentitySource::UserManagement => "user_management",
        }
    }
}

pub const DEFAULT_SOURCES: [IdentitySource; 2] =
    [IdentitySource::SsoProfile, IdentitySource::UserManagement];

/// Why a single identity source did not produce a user.
#[derive(Debug, thiserror::Error)]
enum SourceFailure {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("token has no subject")]
    MissingSubject,

    #[error("token expired at {0}")]
    Expired(i64),
}

pub struct SessionResolver<'a, P> {
    provider: &'a P,
    sources: Vec<IdentitySource>,
}

impl<'a, P: IdentityProvider> SessionResolver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self::with_sources(provider, DEFAULT_SOURCES.to_vec())
    }

    pub fn with_sources(provider: &'a P, sources: Vec<IdentitySource>) -> Self {
        Self { provider, sources }
    }

    /// Resolve the request's session, or `None` when unauthenticated.
    pub async fn get_session(&self, credentials: &impl CredentialStore) -> Option<Session> {
        let access_token = credentials.get(ACCESS_TOKEN).filter(|t| !t.is_empty())?;

        for source in &self.sources {
            match self.resolve_with(*source, &access_token).await {
                Ok(user) => {
                    tracing::debug!(user_id = %user.id, source = source.name(), "session resolved");
                    return Some(Session { user, access_token });
                }
                Err(SourceFailure::Expired(exp)) => {
                    ocsf::authentication_event(
                        ocsf::ACTIVITY_LOGON,
                        "Logon",
                        ocsf::STATUS_FAILURE,
                        ocsf::SEVERITY_LOW,
                        None,
                        &format!("Rejected expired access token (exp {exp})"),
                    );
                }
                Err(e) => {
                    tracing::debug!(source = source.name(), error = %e, "identity source failed");
                }
            }
        }

        None
    }

    pub async fn is_authenticated(&self, credentials: &impl CredentialStore) -> bool {
        self.get_session(credentials).await.is_some()
    }

    /// User of the current session.
    ///
    /// For handlers already behind an authentication gate: a missing
    /// session here is a caller bug and surfaces as an error.
    pub async fn get_current_user(
        &self,
        credentials: &impl CredentialStore,
    ) -> Result<SessionUser, AuthError> {
        self.get_session(credentials)
            .await
            .map(|s| s.user)
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn resolve_with(
        &self,
        source: IdentitySource,
        access_token: &str,
    ) -> Result<SessionUser, SourceFailure> {
        match source {
            IdentitySource::SsoProfile => {
                let profile = self.provider.sso_get_profile(access_token).await?;
                Ok(SessionUser::from(profile))
            }
            IdentitySource::UserManagement => {
                let claims = token::decode_payload(access_token)?;
                let user_id = claims.sub().ok_or(SourceFailure::MissingSubject)?;
                if claims.is_expired_at(token::now_secs()) {
                    return Err(SourceFailure::Expired(claims.exp().unwrap_or_default()));
                }
                let record = self.provider.get_user(user_id).await?;
                Ok(SessionUser::from(record))
            }
        }
    }
}

impl From<Profile> for SessionUser {
    fn from(p: Profile) -> Self {
        Self {
            id: p.id,
            email: p.email,
            first_name: p.first_name,
            last_name: p.last_name,
            profile_picture_url: p.profile_picture_url,
        }
    }
}

impl From<UserRecord> for SessionUser {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            profile_picture_url: u.profile_picture_url,
        }
    }
}
