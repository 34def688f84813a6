//! Relational store boundary.
//!
//! Provides the `Store` trait over the tables the access core reads and
//! writes, a PostgREST backend for production and an in-memory backend
//! for development/testing.
//!
//! "No row" is `Ok(None)` / an empty `Vec`; `Err` is reserved for
//! connectivity and server failures.

pub mod memory;
pub mod postgrest;

use serde::{Deserialize, Serialize};

/// A locally mirrored team, keyed by `(name, parent_organization_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_organization_id: Option<String>,
}

/// Application-wide role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessRole {
    Admin,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Visible to every authenticated user.
    Base,
    /// Visible to members of the document's access groups.
    Team,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(rename = "document_type")]
    pub kind: DocumentKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Team,
    Private,
}

/// Stored file metadata. The bytes live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub uploaded_by: Option<String>,
    pub visibility: Visibility,
    #[serde(default)]
    pub team_name: Option<String>,
}

/// Tables used by the access core.
///
/// Writes are upserts keyed by natural identity; duplicate concurrent
/// writes are resolved by the store's uniqueness constraints.
pub trait Store: Send + Sync {
    /// Names of every known team.
    fn list_team_names(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;

    fn find_team(
        &self,
        name: &str,
        organization_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Team>, StoreError>> + Send;

    /// Insert the team if `(name, organization_id)` is new; return the stored row.
    fn upsert_team(
        &self,
        name: &str,
        organization_id: &str,
    ) -> impl std::future::Future<Output = Result<Team, StoreError>> + Send;

    fn user_group_names(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;

    fn add_user_group(
        &self,
        user_id: &str,
        group_name: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    fn user_role(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<AccessRole>, StoreError>> + Send;

    fn set_user_role(
        &self,
        user_id: &str,
        role: AccessRole,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    fn get_document(
        &self,
        document_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Group names joined to a document.
    fn document_access_groups(
        &self,
        document_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>, StoreError>> + Send;

    fn get_file(
        &self,
        file_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<FileRecord>, StoreError>> + Send;
}

/// Store backend selected at startup.
///
/// `Store` uses RPITIT, so it is not object-safe; this enum dispatches
/// manually instead.
pub enum AnyStore {
    Memory(memory::MemoryStore),
    Postgrest(postgrest::PostgrestStore),
}

impl AnyStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            AnyStore::Memory(_) => "memory",
            AnyStore::Postgrest(_) => "postgrest",
        }
    }

    pub fn as_memory(&self) -> Option<&memory::MemoryStore> {
        match self {
            AnyStore::Memory(store) => Some(store),
            AnyStore::Postgrest(_) => None,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            AnyStore::Memory($store) => $call.await,
            AnyStore::Postgrest($store) => $call.await,
        }
    };
}

impl Store for AnyStore {
    async fn list_team_names(&self) -> Result<Vec<String>, StoreError> {
        dispatch!(self, s => s.list_team_names())
    }

    async fn find_team(&self, name: &str, organization_id: &str) -> Result<Option<Team>, StoreError> {
        dispatch!(self, s => s.find_team(name, organization_id))
    }

    async fn upsert_team(&self, name: &str, organization_id: &str) -> Result<Team, StoreError> {
        dispatch!(self, s => s.upsert_team(name, organization_id))
    }

    async fn user_group_names(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        dispatch!(self, s => s.user_group_names(user_id))
    }

    async fn add_user_group(&self, user_id: &str, group_name: &str) -> Result<(), StoreError> {
        dispatch!(self, s => s.add_user_group(user_id, group_name))
    }

    async fn user_role(&self, user_id: &str) -> Result<Option<AccessRole>, StoreError> {
        dispatch!(self, s => s.user_role(user_id))
    }

    async fn set_user_role(&self, user_id: &str, role: AccessRole) -> Result<(), StoreError> {
        dispatch!(self, s => s.set_user_role(user_id, role))
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Document>, StoreError> {
        dispatch!(self, s => s.get_document(document_id))
    }

    async fn document_access_groups(&self, document_id: &str) -> Result<Vec<String>, StoreError> {
        dispatch!(self, s => s.document_access_groups(document_id))
    }

    async fn get_file(&self, file_id: &str) -> Result<Option<FileRecord>, StoreError> {
        dispatch!(self, s => s.get_file(file_id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    RequestFailed(String),

    #[error("store returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("unexpected store response: {0}")]
    InvalidResponse(String),

    #[error("store unavailable")]
    Unavailable,
}
