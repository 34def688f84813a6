//! POST /api/refresh

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use crate::error::AppError;
use crate::session::credentials::{CookieCredentials, make_set_cookie};
use crate::session::refresh::{RefreshOutcome, TokenRefresher};
use crate::session::{ACCESS_TOKEN, REFRESH_TOKEN};
use crate::types::RefreshResponse;

/// Refresh the access token when it is close to expiry.
///
/// A refreshed token (and a rotated refresh token) is written back as
/// cookies. A failed exchange is not an error: the current token stays.
pub async fn refresh(
    State(state): State<Arc<crate::AppState>>,
    credentials: CookieCredentials,
) -> Result<Response, AppError> {
    let outcome = TokenRefresher::new(&state.provider)
        .refresh(&credentials)
        .await;

    match outcome {
        RefreshOutcome::Missing => Err(AppError::NotAuthenticated),
        RefreshOutcome::Unchanged(_) => {
            Ok(Json(RefreshResponse { refreshed: false }).into_response())
        }
        RefreshOutcome::Refreshed {
            access_token,
            refresh_token,
        } => {
            let https_only = state.config.cookie_https_only;
            let mut headers = HeaderMap::new();
            headers.append(
                header::SET_COOKIE,
                cookie_header(ACCESS_TOKEN, &access_token, https_only)?,
            );
            if let Some(rt) = refresh_token {
                headers.append(
                    header::SET_COOKIE,
                    cookie_header(REFRESH_TOKEN, &rt, https_only)?,
                );
            }
            Ok((headers, Json(RefreshResponse { refreshed: true })).into_response())
        }
    }
}

fn cookie_header(name: &str, value: &str, https_only: bool) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&make_set_cookie(name, value, https_only))
        .map_err(|e| AppError::Internal(format!("invalid cookie value for {name}: {e}")))
}
