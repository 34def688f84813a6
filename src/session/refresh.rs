//! Proactive access-token refresh.
//!
//! A token expiring within [`REFRESH_WINDOW`] is exchanged for a new one
//! when a refresh token is available. A failed exchange returns the old
//! token: it is still valid for a few minutes and a failed refresh must
//! never fail the request. Persisting a new token is the caller's job.

use std::time::Duration;

use super::{ACCESS_TOKEN, CredentialStore, REFRESH_TOKEN};
use crate::identity::IdentityProvider;
use crate::identity::token;
use crate::ocsf;

pub const REFRESH_WINDOW: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No access token in the request.
    Missing,
    /// Current token kept (not due, not decodable, or refresh failed).
    Unchanged(String),
    Refreshed {
        access_token: String,
        /// Rotated refresh token, when the provider issued one.
        refresh_token: Option<String>,
    },
}

impl RefreshOutcome {
    pub fn into_token(self) -> Option<String> {
        match self {
            RefreshOutcome::Missing => None,
            RefreshOutcome::Unchanged(token) => Some(token),
            RefreshOutcome::Refreshed { access_token, .. } => Some(access_token),
        }
    }
}

pub struct TokenRefresher<'a, P> {
    provider: &'a P,
    window: Duration,
}

impl<'a, P: IdentityProvider> TokenRefresher<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            window: REFRESH_WINDOW,
        }
    }

    /// Token to use for this request, refreshed when close to expiry.
    pub async fn refresh_if_needed(&self, credentials: &impl CredentialStore) -> Option<String> {
        self.refresh(credentials).await.into_token()
    }

    pub async fn refresh(&self, credentials: &impl CredentialStore) -> RefreshOutcome {
        let Some(access_token) = credentials.get(ACCESS_TOKEN).filter(|t| !t.is_empty()) else {
            return RefreshOutcome::Missing;
        };

        let claims = match token::decode_payload(&access_token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "access token not decodable, passing through");
                return RefreshOutcome::Unchanged(access_token);
            }
        };

        if !claims.expires_within(token::now_millis(), self.window) {
            return RefreshOutcome::Unchanged(access_token);
        }

        let Some(refresh_token) = credentials.get(REFRESH_TOKEN).filter(|t| !t.is_empty()) else {
            return RefreshOutcome::Unchanged(access_token);
        };

        let user_id = claims.sub().map(str::to_string);
        match self.provider.refresh_access_token(&refresh_token).await {
            Ok(tokens) if !tokens.access_token.is_empty() => {
                ocsf::authentication_event(
                    ocsf::ACTIVITY_SERVICE_TICKET,
                    "Service Ticket",
                    ocsf::STATUS_SUCCESS,
                    ocsf::SEVERITY_INFORMATIONAL,
                    user_id.as_deref(),
                    "Token refresh succeeded",
                );
                RefreshOutcome::Refreshed {
                    access_token: tokens.access_token,
                    refresh_token: tokens.refresh_token.filter(|t| !t.is_empty()),
                }
            }
            Ok(_) => {
                tracing::warn!("refresh exchange returned an empty access token");
                RefreshOutcome::Unchanged(access_token)
            }
            Err(e) => {
                ocsf::authentication_event(
                    ocsf::ACTIVITY_SERVICE_TICKET,
                    "Service Ticket",
                    ocsf::STATUS_FAILURE,
                    ocsf::SEVERITY_MEDIUM,
                    user_id.as_deref(),
                    &format!("Token refresh failed, keeping current token: {e}"),
                );
                RefreshOutcome::Unchanged(access_token)
            }
        }
    }
}
