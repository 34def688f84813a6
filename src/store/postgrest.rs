//! PostgREST (Supabase) store backend for production deployments.
//!
//! Table layout:
//! - `teams` (`id`, `name`, `parent_organization_id`): unique on
//!   `(name, parent_organization_id)`
//! - `user_groups` (`user_id`, `group_name`): unique on both columns
//! - `user_roles` (`user_id`, `role`): unique on `user_id`
//! - `documents` (`id`, `document_type`)
//! - `document_access_groups` (`document_id`, `group_name`)
//! - `files` (`id`, `document_id`, `application_id`, `uploaded_by`,
//!   `visibility`, `team_name`)
//!
//! Single-row reads ask for `application/vnd.pgrst.object+json`; PostgREST
//! answers a zero-row result with error `PGRST116`, which maps to `None`.

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{AccessRole, Document, FileRecord, Store, StoreError, Team};
use crate::config::Config;

/// PostgREST code for "JSON object requested, multiple (or no) rows returned".
pub const NO_ROWS_CODE: &str = "PGRST116";

const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct PostgrestStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct NameRow {
    name: String,
}

#[derive(Deserialize)]
struct GroupNameRow {
    group_name: String,
}

#[derive(Deserialize)]
struct RoleRow {
    role: AccessRole,
}

impl PostgrestStore {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self::with_base_url(http, &config.postgrest_url(), &config.supabase_service_key)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table(&self, method: reqwest::Method, table: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}/{}", self.base_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn rows<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>, StoreError> {
        let resp = send(request).await?;
        resp.json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))
    }

    async fn single<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, StoreError> {
        match send(request.header("Accept", SINGLE_OBJECT)).await {
            Ok(resp) => resp
                .json()
                .await
                .map(Some)
                .map_err(|e| StoreError::InvalidResponse(e.to_string())),
            Err(StoreError::Api { code, .. }) if code == NO_ROWS_CODE => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn execute(&self, request: RequestBuilder) -> Result<(), StoreError> {
        send(request).await.map(|_| ())
    }
}

async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    let resp = request
        .send()
        .await
        .map_err(|e| StoreError::RequestFailed(e.to_string()))?;

    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body: Value = resp.json().await.unwrap_or(Value::Null);
    Err(StoreError::Api {
        status: status.as_u16(),
        code: body
            .get("code")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        message: body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string(),
    })
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl Store for PostgrestStore {
    async fn list_team_names(&self) -> Result<Vec<String>, StoreError> {
        let rows: Vec<NameRow> = self
            .rows(
                self.table(reqwest::Method::GET, "teams")
                    .query(&[("select", "name"), ("order", "name.asc")]),
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    async fn find_team(&self, name: &str, organization_id: &str) -> Result<Option<Team>, StoreError> {
        self.single(self.table(reqwest::Method::GET, "teams").query(&[
            ("select", "id,name,parent_organization_id".to_string()),
            ("name", eq(name)),
            ("parent_organization_id", eq(organization_id)),
        ]))
        .await
    }

    async fn upsert_team(&self, name: &str, organization_id: &str) -> Result<Team, StoreError> {
        let rows: Vec<Team> = self
            .rows(
                self.table(reqwest::Method::POST, "teams")
                    .query(&[("on_conflict", "name,parent_organization_id")])
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .json(&json!([{ "name": name, "parent_organization_id": organization_id }])),
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse("upsert returned no rows".into()))
    }

    async fn user_group_names(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<GroupNameRow> = self
            .rows(self.table(reqwest::Method::GET, "user_groups").query(&[
                ("select", "group_name".to_string()),
                ("user_id", eq(user_id)),
            ]))
            .await?;
        Ok(rows.into_iter().map(|r| r.group_name).collect())
    }

    async fn add_user_group(&self, user_id: &str, group_name: &str) -> Result<(), StoreError> {
        self.execute(
            self.table(reqwest::Method::POST, "user_groups")
                .query(&[("on_conflict", "user_id,group_name")])
                .header("Prefer", "resolution=ignore-duplicates,return=minimal")
                .json(&json!([{ "user_id": user_id, "group_name": group_name }])),
        )
        .await
    }

    async fn user_role(&self, user_id: &str) -> Result<Option<AccessRole>, StoreError> {
        let row: Option<RoleRow> = self
            .single(self.table(reqwest::Method::GET, "user_roles").query(&[
                ("select", "role".to_string()),
                ("user_id", eq(user_id)),
            ]))
            .await?;
        Ok(row.map(|r| r.role))
    }

    async fn set_user_role(&self, user_id: &str, role: AccessRole) -> Result<(), StoreError> {
        self.execute(
            self.table(reqwest::Method::POST, "user_roles")
                .query(&[("on_conflict", "user_id")])
                .header("Prefer", "resolution=merge-duplicates,return=minimal")
                .json(&json!([{ "user_id": user_id, "role": role }])),
        )
        .await
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        self.single(self.table(reqwest::Method::GET, "documents").query(&[
            ("select", "id,document_type".to_string()),
            ("id", eq(document_id)),
        ]))
        .await
    }

    async fn document_access_groups(&self, document_id: &str) -> Result<Vec<String>, StoreError> {
        let rows: Vec<GroupNameRow> = self
            .rows(
                self.table(reqwest::Method::GET, "document_access_groups")
                    .query(&[
                        ("select", "group_name".to_string()),
                        ("document_id", eq(document_id)),
                    ]),
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.group_name).collect())
    }

    async fn get_file(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        self.single(self.table(reqwest::Method::GET, "files").query(&[
            (
                "select",
                "id,document_id,application_id,uploaded_by,visibility,team_name".to_string(),
            ),
            ("id", eq(file_id)),
        ]))
        .await
    }
}
