//! POST /api/users/{id}/groups

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use std::sync::Arc;

use super::context::Authenticated;
use crate::access::groups::GroupResolver;
use crate::error::AppError;
use crate::store::Store;
use crate::types::{AssignGroupsRequest, AssignGroupsResponse};

/// Add local groups for a user. Admins only.
///
/// These rows feed the fallback path of group resolution.
pub async fn assign_groups(
    State(state): State<Arc<crate::AppState>>,
    Path(user_id): Path<String>,
    auth: Authenticated,
    payload: Result<Json<AssignGroupsRequest>, JsonRejection>,
) -> Result<Json<AssignGroupsResponse>, AppError> {
    let Json(req) = payload?;
    let resolver = GroupResolver::new(&state.provider, &state.store, &state.pipeline);
    if !resolver.is_admin(&auth.scope, None).await {
        tracing::warn!(caller = auth.user_id(), target_user = %user_id, "group assignment refused");
        return Err(AppError::Forbidden);
    }

    let names: Vec<&str> = req.groups.iter().map(|g| g.trim()).collect();
    if names.is_empty() || names.iter().any(|n| n.is_empty()) {
        return Err(AppError::BadRequest("Group names must be non-empty".into()));
    }

    for name in &names {
        state
            .store
            .add_user_group(&user_id, name)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }
    let groups = state
        .store
        .user_group_names(&user_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(
        caller = auth.user_id(),
        target_user = %user_id,
        count = names.len(),
        "local groups assigned"
    );
    Ok(Json(AssignGroupsResponse { user_id, groups }))
}
