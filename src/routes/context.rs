//! Authenticated request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::sync::Arc;

use crate::AppState;
use crate::access::RequestScope;
use crate::error::AppError;
use crate::session::Session;
use crate::session::credentials::CookieCredentials;
use crate::session::resolver::SessionResolver;

/// Extractor for handlers that need a signed-in user.
///
/// Resolves the session from the request's cookies and opens a fresh
/// [`RequestScope`] for it. Rejects with 401 when there is no session.
pub struct Authenticated {
    pub session: Session,
    pub scope: RequestScope,
}

impl Authenticated {
    pub fn user_id(&self) -> &str {
        &self.session.user.id
    }
}

impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let credentials = match CookieCredentials::from_request_parts(parts, state).await {
            Ok(credentials) => credentials,
            Err(never) => match never {},
        };
        let session = SessionResolver::new(&state.provider)
            .get_session(&credentials)
            .await
            .ok_or(AppError::NotAuthenticated)?;
        Ok(Self {
            scope: RequestScope::with_user(session.user.clone()),
            session,
        })
    }
}
