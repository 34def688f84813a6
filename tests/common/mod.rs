//! Test utilities: token factory, wiremock WorkOS, test app builder.

#![allow(dead_code)]

use hub_access::config::{Config, PipelineConfig, PipelineSettings};
use hub_access::identity::client::WorkOsClient;
use hub_access::identity::token::{encode_unsigned, now_secs};
use hub_access::store::AnyStore;
use hub_access::store::memory::MemoryStore;
use hub_access::{AppState, create_app};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Unsigned access token for `sub`, expiring `ttl_secs` from now.
pub fn access_token(sub: &str, ttl_secs: i64) -> String {
    encode_unsigned(&json!({
        "sub": sub,
        "sid": "session_01",
        "iss": "https://api.workos.com",
        "exp": now_secs() + ttl_secs,
        "iat": now_secs() - 60,
    }))
}

pub fn cookie_header(access_token: &str, refresh_token: Option<&str>) -> String {
    match refresh_token {
        Some(rt) => format!("access-token={access_token}; refresh-token={rt}"),
        None => format!("access-token={access_token}"),
    }
}

/// Fake WorkOS API.
pub struct WorkOs {
    pub server: MockServer,
}

impl WorkOs {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Register a user-management record.
    pub async fn user(&self, id: &str, email: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/user_management/users/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "user",
                "id": id,
                "email": email,
                "first_name": "Test",
                "last_name": "User",
                "profile_picture_url": null
            })))
            .mount(&self.server)
            .await;
    }

    /// Register an SSO profile owning `access_token`.
    pub async fn sso_profile(&self, access_token: &str, id: &str, email: &str) {
        Mock::given(method("GET"))
            .and(path("/sso/profile"))
            .and(header("authorization", format!("Bearer {access_token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "email": email,
                "first_name": "Sso"
            })))
            .mount(&self.server)
            .await;
    }

    /// One membership per `(organization_id, organization_name, role)`.
    pub async fn memberships(&self, user_id: &str, entries: &[(&str, &str, &str)]) {
        let data: Vec<_> = entries
            .iter()
            .map(|(org_id, _, role)| {
                json!({
                    "object": "organization_membership",
                    "id": format!("om_{org_id}"),
                    "user_id": user_id,
                    "organization_id": org_id,
                    "role": {"slug": role},
                    "status": "active",
                    "created_at": "2024-03-01T00:00:00.000Z"
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/user_management/organization_memberships"))
            .and(query_param("user_id", user_id))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": data,
                "list_metadata": {"before": null, "after": null}
            })))
            .mount(&self.server)
            .await;

        for (org_id, org_name, _) in entries {
            Mock::given(method("GET"))
                .and(path(format!("/organizations/{org_id}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "object": "organization",
                    "id": org_id,
                    "name": org_name
                })))
                .mount(&self.server)
                .await;
        }
    }

    pub async fn refresh_ok(&self, access_token: &str, refresh_token: &str) {
        Mock::given(method("POST"))
            .and(path("/user_management/authenticate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access_token,
                "refresh_token": refresh_token
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn refresh_rejected(&self) {
        Mock::given(method("POST"))
            .and(path("/user_management/authenticate"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Refresh token revoked"
            })))
            .mount(&self.server)
            .await;
    }

    /// Requests received for `route`.
    pub async fn hits(&self, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == route)
            .count()
    }
}

pub fn test_config(workos: &WorkOs) -> Config {
    Config {
        workos_api_url: workos.uri(),
        ..Config::test_default()
    }
}

/// App over the fake WorkOS and an in-memory store, pipeline enabled.
pub fn build_test_app(workos: &WorkOs) -> (axum::Router, Arc<AppState>) {
    build_test_app_with(test_config(workos), PipelineConfig::default())
}

pub fn build_test_app_with(
    config: Config,
    pipeline: PipelineConfig,
) -> (axum::Router, Arc<AppState>) {
    let http_client = reqwest::Client::new();
    let state = Arc::new(AppState {
        provider: WorkOsClient::new(http_client, &config),
        store: AnyStore::Memory(MemoryStore::new()),
        pipeline: PipelineSettings::Fixed(pipeline),
        config,
    });
    let app = create_app(state.clone());
    (app, state)
}

pub fn memory(state: &AppState) -> &MemoryStore {
    state
        .store
        .as_memory()
        .expect("test app uses the in-memory store")
}
