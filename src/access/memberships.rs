//! Organization memberships with organization names.

use serde::Serialize;

use super::RequestScope;
use crate::identity::{IdentityProvider, MembershipRole, ProviderError, normalize_role};

/// A membership enriched with its organization's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganizationMembership {
    pub organization_id: String,
    /// Falls back to `organization_id` when the name lookup failed.
    pub organization_name: String,
    pub role: Option<MembershipRole>,
    pub created_at: Option<String>,
}

impl OrganizationMembership {
    pub fn normalized_role(&self) -> String {
        normalize_role(self.role.as_ref())
    }
}

pub struct MembershipResolver<'a, P> {
    provider: &'a P,
}

impl<'a, P: IdentityProvider> MembershipResolver<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    /// Memberships of `user_id`; empty when the listing fails.
    pub async fn get_memberships(
        &self,
        scope: &RequestScope,
        user_id: &str,
        force_refresh: bool,
    ) -> Vec<OrganizationMembership> {
        match self.lookup(scope, user_id, force_refresh).await {
            Ok(memberships) => memberships,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "membership listing failed");
                Vec::new()
            }
        }
    }

    /// Like [`get_memberships`](Self::get_memberships) but a failed
    /// listing is returned as `Err`. A `not_found` listing is `Ok(vec![])`.
    ///
    /// Served from the scope memo unless `force_refresh`; successful
    /// fetches replace the memo entry.
    pub async fn lookup(
        &self,
        scope: &RequestScope,
        user_id: &str,
        force_refresh: bool,
    ) -> Result<Vec<OrganizationMembership>, ProviderError> {
        if !force_refresh && let Some(memberships) = scope.cached(user_id).await {
            return Ok(memberships);
        }

        let memberships = self.fetch(user_id).await?;
        scope.remember(user_id, &memberships).await;
        Ok(memberships)
    }

    async fn fetch(&self, user_id: &str) -> Result<Vec<OrganizationMembership>, ProviderError> {
        let raw = match self.provider.list_memberships(user_id).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                tracing::debug!(user_id, "user has no organization memberships");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut memberships = Vec::with_capacity(raw.len());
        for m in raw {
            let organization_name = match self.provider.get_organization(&m.organization_id).await
            {
                Ok(org) => org.name,
                Err(e) => {
                    tracing::warn!(
                        organization_id = %m.organization_id,
                        error = %e,
                        "organization name lookup failed, using id"
                    );
                    m.organization_id.clone()
                }
            };
            memberships.push(OrganizationMembership {
                organization_id: m.organization_id,
                organization_name,
                role: m.role,
                created_at: m.created_at,
            });
        }
        Ok(memberships)
    }
}
