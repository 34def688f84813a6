//! WorkOS HTTP client implementing [`IdentityProvider`].
//!
//! All management calls authenticate with the API key; the SSO profile
//! lookup authenticates with the user's own access token.

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{
    IdentityProvider, Membership, Organization, Profile, ProviderError, RefreshedTokens,
    UserRecord,
};
use crate::config::Config;

const MEMBERSHIP_PAGE_SIZE: &str = "100";

#[derive(Clone)]
pub struct WorkOsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    client_id: String,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
    #[serde(default)]
    list_metadata: Option<ListMetadata>,
}

#[derive(Deserialize)]
struct ListMetadata {
    #[serde(default)]
    after: Option<String>,
}

impl WorkOsClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self::with_base_url(
            http,
            &config.workos_api_url,
            &config.workos_api_key,
            &config.workos_client_id,
        )
    }

    pub fn with_base_url(
        http: reqwest::Client,
        base_url: &str,
        api_key: &str,
        client_id: &str,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client_id: client_id.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let resp = request
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        parse_response(resp).await
    }
}

/// Map a provider response to a value or a classified error.
///
/// Error bodies look like `{"code": "...", "message": "..."}`; OAuth-style
/// endpoints use `error` / `error_description` instead.
async fn parse_response<T: DeserializeOwned>(resp: Response) -> Result<T, ProviderError> {
    let status = resp.status();
    if status.is_success() {
        return resp
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()));
    }

    let body: Value = resp.json().await.unwrap_or(Value::Null);
    let code = body
        .get("code")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let message = body
        .get("message")
        .or_else(|| body.get("error_description"))
        .and_then(Value::as_str)
        .unwrap_or("request failed")
        .to_string();

    if status.as_u16() == 404 {
        return Err(ProviderError::NotFound(message));
    }
    Err(ProviderError::Api {
        status: status.as_u16(),
        code,
        message,
    })
}

impl IdentityProvider for WorkOsClient {
    async fn sso_get_profile(&self, access_token: &str) -> Result<Profile, ProviderError> {
        self.send(
            self.http
                .get(self.url("/sso/profile"))
                .bearer_auth(access_token),
        )
        .await
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, ProviderError> {
        self.send(
            self.http
                .get(self.url(&format!("/user_management/users/{user_id}")))
                .bearer_auth(&self.api_key),
        )
        .await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<RefreshedTokens, ProviderError> {
        let body = serde_json::json!({
            "client_id": self.client_id,
            "client_secret": self.api_key,
            "grant_type": "refresh_token",
            "refresh_token": refresh_token,
        });
        self.send(
            self.http
                .post(self.url("/user_management/authenticate"))
                .json(&body),
        )
        .await
    }

    /// Follows `list_metadata.after` cursors until the listing is exhausted.
    async fn list_memberships(&self, user_id: &str) -> Result<Vec<Membership>, ProviderError> {
        let mut memberships = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut query = vec![("user_id", user_id), ("limit", MEMBERSHIP_PAGE_SIZE)];
            if let Some(cursor) = after.as_deref() {
                query.push(("after", cursor));
            }

            let page: ListResponse<Membership> = self
                .send(
                    self.http
                        .get(self.url("/user_management/organization_memberships"))
                        .query(&query)
                        .bearer_auth(&self.api_key),
                )
                .await?;

            memberships.extend(page.data);
            match page.list_metadata.and_then(|m| m.after) {
                Some(cursor) if !cursor.is_empty() => after = Some(cursor),
                _ => break,
            }
        }

        Ok(memberships)
    }

    async fn get_organization(&self, organization_id: &str) -> Result<Organization, ProviderError> {
        self.send(
            self.http
                .get(self.url(&format!("/organizations/{organization_id}")))
                .bearer_auth(&self.api_key),
        )
        .await
    }
}
