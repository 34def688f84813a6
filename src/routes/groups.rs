//! GET /api/groups

use axum::Json;
use axum::extract::{Query, State};
use std::sync::Arc;

use super::context::Authenticated;
use crate::access::groups::GroupResolver;
use crate::access::memberships::MembershipResolver;
use crate::types::{GroupsQuery, GroupsResponse};

/// Memberships and resolved groups of the session user.
///
/// `force_refresh=true` bypasses the request memo; the fresh listing then
/// feeds the group resolution below.
pub async fn groups(
    State(state): State<Arc<crate::AppState>>,
    Query(query): Query<GroupsQuery>,
    auth: Authenticated,
) -> Json<GroupsResponse> {
    let user_id = auth.user_id();
    let memberships = MembershipResolver::new(&state.provider)
        .get_memberships(&auth.scope, user_id, query.force_refresh)
        .await;
    let groups = GroupResolver::new(&state.provider, &state.store, &state.pipeline)
        .get_user_groups(&auth.scope, user_id)
        .await;

    Json(GroupsResponse {
        user_id: user_id.to_string(),
        memberships,
        groups,
    })
}
