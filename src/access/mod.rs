//! Group/role resolution and access decisions.
//!
//! Everything here runs per request against the identity provider and the
//! relational store. The only state carried between calls is the
//! [`RequestScope`], created for one request and dropped with it.

pub mod decision;
pub mod groups;
pub mod memberships;
pub mod validation;

use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::session::SessionUser;
use memberships::OrganizationMembership;

/// Per-request memo.
///
/// Holds the session user (if any) and the membership listings already
/// fetched during this request, so the group pipeline and the admin check
/// share one provider round trip.
#[derive(Debug, Default)]
pub struct RequestScope {
    user: Option<SessionUser>,
    memberships: Mutex<HashMap<String, Vec<OrganizationMembership>>>,
}

impl RequestScope {
    /// Scope with no session user.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: SessionUser) -> Self {
        Self {
            user: Some(user),
            memberships: Mutex::default(),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.id.as_str())
    }

    /// `user_id` when given, else the session user's id.
    pub(crate) fn subject<'a>(&'a self, user_id: Option<&'a str>) -> Option<&'a str> {
        user_id.or_else(|| self.user_id())
    }

    pub(crate) async fn cached(&self, user_id: &str) -> Option<Vec<OrganizationMembership>> {
        self.memberships.lock().await.get(user_id).cloned()
    }

    pub(crate) async fn remember(&self, user_id: &str, memberships: &[OrganizationMembership]) {
        self.memberships
            .lock()
            .await
            .insert(user_id.to_string(), memberships.to_vec());
    }
}
