//! Scripted identity provider for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::identity::{
    IdentityProvider, Membership, MembershipRole, Organization, Profile, ProviderError,
    RefreshedTokens, UserRecord,
};

/// Provider whose answers are set up front. Every call is counted.
#[derive(Default)]
pub struct FakeProvider {
    profiles: HashMap<String, Profile>,
    users: HashMap<String, UserRecord>,
    refreshed: Option<RefreshedTokens>,
    memberships: HashMap<String, Vec<Membership>>,
    listing_error: Option<(u16, String)>,
    organizations: HashMap<String, String>,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, access_token: &str, id: &str, email: &str) -> Self {
        self.profiles.insert(
            access_token.into(),
            Profile {
                id: id.into(),
                email: email.into(),
                first_name: Some("Sso".into()),
                last_name: None,
                profile_picture_url: None,
            },
        );
        self
    }

    pub fn with_user(mut self, id: &str, email: &str) -> Self {
        self.users.insert(
            id.into(),
            UserRecord {
                id: id.into(),
                email: email.into(),
                first_name: Some("Ada".into()),
                last_name: Some("Lovelace".into()),
                profile_picture_url: None,
            },
        );
        self
    }

    pub fn with_refresh(mut self, access_token: &str, refresh_token: Option<&str>) -> Self {
        self.refreshed = Some(RefreshedTokens {
            access_token: access_token.into(),
            refresh_token: refresh_token.map(String::from),
        });
        self
    }

    /// Membership of `user_id` in `organization_id` with a bare role name.
    pub fn with_membership(self, user_id: &str, organization_id: &str, role: &str) -> Self {
        self.with_membership_role(
            user_id,
            organization_id,
            Some(MembershipRole::Name(role.into())),
        )
    }

    pub fn with_membership_role(
        mut self,
        user_id: &str,
        organization_id: &str,
        role: Option<MembershipRole>,
    ) -> Self {
        self.memberships
            .entry(user_id.into())
            .or_default()
            .push(Membership {
                id: None,
                organization_id: organization_id.into(),
                role,
                created_at: Some("2024-01-01T00:00:00.000Z".into()),
            });
        self
    }

    pub fn with_organization(mut self, id: &str, name: &str) -> Self {
        self.organizations.insert(id.into(), name.into());
        self
    }

    /// Make every membership listing fail with `status` / `code`.
    pub fn with_listing_error(mut self, status: u16, code: &str) -> Self {
        self.listing_error = Some((status, code.into()));
        self
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls
            .lock()
            .map(|c| c.get(method).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(method).or_default() += 1;
        }
    }
}

impl IdentityProvider for FakeProvider {
    async fn sso_get_profile(&self, access_token: &str) -> Result<Profile, ProviderError> {
        self.record("sso_get_profile");
        self.profiles
            .get(access_token)
            .cloned()
            .ok_or_else(|| ProviderError::Api {
                status: 401,
                code: "invalid_token".into(),
                message: "not an SSO access token".into(),
            })
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, ProviderError> {
        self.record("get_user");
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("user {user_id}")))
    }

    async fn refresh_access_token(
        &self,
        _refresh_token: &str,
    ) -> Result<RefreshedTokens, ProviderError> {
        self.record("refresh_access_token");
        self.refreshed.clone().ok_or_else(|| ProviderError::Api {
            status: 400,
            code: "invalid_grant".into(),
            message: "refresh token revoked".into(),
        })
    }

    async fn list_memberships(&self, user_id: &str) -> Result<Vec<Membership>, ProviderError> {
        self.record("list_memberships");
        if let Some((status, code)) = &self.listing_error {
            return Err(ProviderError::Api {
                status: *status,
                code: code.clone(),
                message: "listing failed".into(),
            });
        }
        Ok(self.memberships.get(user_id).cloned().unwrap_or_default())
    }

    async fn get_organization(&self, organization_id: &str) -> Result<Organization, ProviderError> {
        self.record("get_organization");
        self.organizations
            .get(organization_id)
            .map(|name| Organization {
                id: organization_id.into(),
                name: name.clone(),
            })
            .ok_or_else(|| ProviderError::RequestFailed("organization lookup timed out".into()))
    }
}
