//! GET /api/files/{id}/permission

use axum::Json;
use axum::extract::{Path, State};
use std::sync::Arc;

use super::context::Authenticated;
use crate::access::decision::{AccessDecisions, FileDecision};
use crate::access::validation::validate_uuid;
use crate::error::AppError;
use crate::types::FilePermissionResponse;

/// Whether the session user may modify the file.
pub async fn file_permission(
    State(state): State<Arc<crate::AppState>>,
    Path(file_id): Path<String>,
    auth: Authenticated,
) -> Result<Json<FilePermissionResponse>, AppError> {
    validate_uuid(&file_id)?;

    let decision = AccessDecisions::new(&state.provider, &state.store, &state.pipeline)
        .check_file_permission(&auth.scope, auth.user_id(), &file_id)
        .await;
    match decision {
        FileDecision::NotFound => Err(AppError::NotFound("File not found".into())),
        FileDecision::Error => Err(AppError::Internal(format!(
            "file permission check failed for {file_id}"
        ))),
        FileDecision::Allowed | FileDecision::Denied => Ok(Json(FilePermissionResponse {
            file_id,
            can_modify: decision.can_modify(),
        })),
    }
}
