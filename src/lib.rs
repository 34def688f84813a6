//! Knowledge hub access core.
//!
//! Resolves sessions against a WorkOS-style identity provider, maps
//! organization memberships onto locally mirrored teams, and answers
//! document/file access questions over a small Axum API.

pub mod access;
pub mod config;
pub mod error;
pub mod identity;
pub mod ocsf;
pub mod routes;
pub mod session;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Config, PipelineSettings};
use crate::identity::client::WorkOsClient;
use crate::store::AnyStore;

/// Shared application state available to all route handlers.
pub struct AppState {
    pub config: Config,
    pub provider: WorkOsClient,
    pub store: AnyStore,
    pub pipeline: PipelineSettings,
}

/// Build the Axum router with all middleware and routes.
pub fn create_app(state: Arc<AppState>) -> Router {
    // CORS: single frontend origin with credentials
    let origin = match HeaderValue::from_str(&state.config.frontend_url) {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(
                frontend_url = %state.config.frontend_url,
                error = %e,
                "invalid FRONTEND_URL, CORS disabled"
            );
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let timeout = Duration::from_secs(state.config.request_timeout_secs);

    let api = Router::new()
        .route("/me", get(routes::me::me))
        .route("/groups", get(routes::groups::groups))
        .route("/refresh", post(routes::refresh::refresh))
        .route(
            "/documents/access",
            post(routes::documents::batch_document_access),
        )
        .route(
            "/documents/{id}/access",
            get(routes::documents::document_access),
        )
        .route("/files/{id}/permission", get(routes::files::file_permission))
        .route("/users/{id}/groups", post(routes::users::assign_groups));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api", api)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
