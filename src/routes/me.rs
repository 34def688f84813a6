//! GET /api/me

use axum::Json;
use axum::extract::State;
use std::sync::Arc;

use super::context::Authenticated;
use crate::access::groups::GroupResolver;
use crate::store::AccessRole;
use crate::types::MeResponse;

/// Session user with resolved groups and role.
pub async fn me(
    State(state): State<Arc<crate::AppState>>,
    auth: Authenticated,
) -> Json<MeResponse> {
    let resolver = GroupResolver::new(&state.provider, &state.store, &state.pipeline);
    let role = resolver.get_user_role(&auth.scope, None).await;
    let groups = resolver.get_user_groups(&auth.scope, auth.user_id()).await;

    Json(MeResponse {
        user: auth.session.user,
        groups,
        role,
        is_admin: role == AccessRole::Admin,
    })
}
