//! Shared request/response DTOs.

use serde::{Deserialize, Serialize};

use crate::access::memberships::OrganizationMembership;
use crate::session::SessionUser;
use crate::store::AccessRole;

/// GET /health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
    pub pipeline: bool,
}

/// GET /api/me response.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: SessionUser,
    pub groups: Vec<String>,
    pub role: AccessRole,
    pub is_admin: bool,
}

/// GET /api/groups query string.
#[derive(Debug, Default, Deserialize)]
pub struct GroupsQuery {
    #[serde(default)]
    pub force_refresh: bool,
}

/// GET /api/groups response.
#[derive(Debug, Serialize)]
pub struct GroupsResponse {
    pub user_id: String,
    pub memberships: Vec<OrganizationMembership>,
    pub groups: Vec<String>,
}

/// POST /api/refresh response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
}

#[derive(Debug, Serialize)]
pub struct DocumentAccessResponse {
    pub document_id: String,
    pub allowed: bool,
}

/// POST /api/documents/access request body.
#[derive(Debug, Deserialize)]
pub struct BatchDocumentAccessRequest {
    pub document_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchDocumentAccessResponse {
    pub results: Vec<DocumentAccessResponse>,
}

/// GET /api/files/{id}/permission response.
#[derive(Debug, Serialize)]
pub struct FilePermissionResponse {
    pub file_id: String,
    pub can_modify: bool,
}

/// POST /api/users/{id}/groups request body.
#[derive(Debug, Deserialize)]
pub struct AssignGroupsRequest {
    pub groups: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AssignGroupsResponse {
    pub user_id: String,
    pub groups: Vec<String>,
}
