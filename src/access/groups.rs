//! Group resolution pipeline.
//!
//! Organization memberships are the source of truth for groups and admin
//! status. A membership's normalized role names a team inside that
//! organization; those teams are mirrored into the local `teams` table on
//! first sight. The local `user_groups` and `user_roles` tables only serve
//! as a fallback when the pipeline is disabled, fails, or yields nothing.

use super::RequestScope;
use super::memberships::{MembershipResolver, OrganizationMembership};
use crate::config::{PipelineConfig, PipelineSettings};
use crate::identity::IdentityProvider;
use crate::store::{AccessRole, Store, StoreError};

/// Synthetic group every admin carries.
pub const ADMIN_GROUP: &str = "Admin";
/// Role that grants organization membership only, no team.
pub const GENERIC_MEMBER_ROLE: &str = "member";

/// Why the pipeline handed over to the local tables.
#[derive(Debug, thiserror::Error)]
enum PipelineError {
    #[error(transparent)]
    Provider(#[from] crate::identity::ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Team-bearing role of a membership, if any.
fn team_role(membership: &OrganizationMembership) -> Option<String> {
    let role = membership.normalized_role();
    if role.is_empty() || role.eq_ignore_ascii_case(GENERIC_MEMBER_ROLE) {
        None
    } else {
        Some(role)
    }
}

fn is_admin_membership(membership: &OrganizationMembership, config: &PipelineConfig) -> bool {
    membership.organization_name.to_lowercase() == config.admin_organization_name.to_lowercase()
}

pub struct GroupResolver<'a, P, S> {
    provider: &'a P,
    store: &'a S,
    settings: &'a PipelineSettings,
}

impl<'a, P: IdentityProvider, S: Store> GroupResolver<'a, P, S> {
    pub fn new(provider: &'a P, store: &'a S, settings: &'a PipelineSettings) -> Self {
        Self {
            provider,
            store,
            settings,
        }
    }

    fn memberships(&self) -> MembershipResolver<'a, P> {
        MembershipResolver::new(self.provider)
    }

    /// Authoritative group names of `user_id`. Never fails.
    pub async fn get_user_groups(&self, scope: &RequestScope, user_id: &str) -> Vec<String> {
        let config = self.settings.load();
        if config.use_external_org_pipeline {
            match self.groups_from_organizations(scope, user_id, &config).await {
                Ok(groups) if !groups.is_empty() => return groups,
                Ok(_) => {
                    tracing::debug!(user_id, "no organization groups, using local groups");
                }
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "group pipeline failed, using local groups");
                }
            }
        }
        self.local_groups(user_id).await
    }

    /// Whether the user (or the scope's session user) is an admin.
    pub async fn is_admin(&self, scope: &RequestScope, user_id: Option<&str>) -> bool {
        self.get_user_role(scope, user_id).await == AccessRole::Admin
    }

    pub async fn get_user_role(&self, scope: &RequestScope, user_id: Option<&str>) -> AccessRole {
        let Some(user_id) = scope.subject(user_id) else {
            return AccessRole::User;
        };

        let config = self.settings.load();
        if config.use_external_org_pipeline {
            match self.memberships().lookup(scope, user_id, false).await {
                Ok(memberships) => {
                    return if memberships.iter().any(|m| is_admin_membership(m, &config)) {
                        AccessRole::Admin
                    } else {
                        AccessRole::User
                    };
                }
                Err(e) => {
                    tracing::warn!(user_id, error = %e, "admin check falling back to local role");
                }
            }
        }
        self.local_role(user_id).await
    }

    async fn groups_from_organizations(
        &self,
        scope: &RequestScope,
        user_id: &str,
        config: &PipelineConfig,
    ) -> Result<Vec<String>, PipelineError> {
        let memberships = self.memberships().lookup(scope, user_id, false).await?;

        self.sync_teams(&memberships).await?;

        if memberships.iter().any(|m| is_admin_membership(m, config)) {
            return Ok(self.admin_groups().await?);
        }

        let mut groups = Vec::new();
        for membership in &memberships {
            let Some(role) = team_role(membership) else {
                continue;
            };
            if let Some(team) = self
                .store
                .find_team(&role, &membership.organization_id)
                .await?
            {
                groups.push(team.name);
            }
        }
        Ok(groups)
    }

    /// Mirror every membership's team into the local `teams` table.
    async fn sync_teams(&self, memberships: &[OrganizationMembership]) -> Result<(), StoreError> {
        for membership in memberships {
            let Some(role) = team_role(membership) else {
                continue;
            };
            if self
                .store
                .find_team(&role, &membership.organization_id)
                .await?
                .is_none()
            {
                let team = self
                    .store
                    .upsert_team(&role, &membership.organization_id)
                    .await?;
                tracing::info!(
                    team_id = %team.id,
                    team = %team.name,
                    organization_id = %membership.organization_id,
                    "synced team from organization membership"
                );
            }
        }
        Ok(())
    }

    async fn admin_groups(&self) -> Result<Vec<String>, StoreError> {
        let mut names = self.store.list_team_names().await?;
        names.sort();
        names.dedup();
        if !names.iter().any(|n| n == ADMIN_GROUP) {
            names.insert(0, ADMIN_GROUP.to_string());
        }
        Ok(names)
    }

    async fn local_groups(&self, user_id: &str) -> Vec<String> {
        match self.store.user_group_names(user_id).await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::error!(user_id, error = %e, "local group lookup failed");
                Vec::new()
            }
        }
    }

    async fn local_role(&self, user_id: &str) -> AccessRole {
        match self.store.user_role(user_id).await {
            Ok(role) => role.unwrap_or(AccessRole::User),
            Err(e) => {
                tracing::error!(user_id, error = %e, "local role lookup failed");
                AccessRole::User
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::MembershipRole;
    use crate::session::SessionUser;
    use crate::store::memory::MemoryStore;
    use crate::testing::FakeProvider;

    fn enabled() -> PipelineSettings {
        PipelineSettings::Fixed(PipelineConfig::default())
    }

    fn disabled() -> PipelineSettings {
        PipelineSettings::Fixed(PipelineConfig {
            use_external_org_pipeline: false,
            ..PipelineConfig::default()
        })
    }

    #[tokio::test]
    async fn test_cdle_field_tech_member_gets_own_team() {
        let provider = FakeProvider::new()
            .with_membership("alice", "org_cdle", "Field-Tech")
            .with_organization("org_cdle", "CDLE");
        let store = MemoryStore::new();
        store.upsert_team("Field-Tech", "org_cdle").await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);

        let groups = resolver.get_user_groups(&RequestScope::new(), "alice").await;
        assert_eq!(groups, vec!["Field-Tech"]);
    }

    #[tokio::test]
    async fn test_non_admin_gets_only_own_teams() {
        let provider = FakeProvider::new()
            .with_membership("alice", "org_a", "Ops")
            .with_organization("org_a", "Acme");
        let store = MemoryStore::new();
        store.upsert_team("Ops", "org_a").await.unwrap();
        store.upsert_team("Finance", "org_a").await.unwrap();
        store.upsert_team("Ops", "org_b").await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);

        let groups = resolver.get_user_groups(&RequestScope::new(), "alice").await;
        assert_eq!(groups, vec!["Ops"]);
    }

    #[tokio::test]
    async fn test_admin_gets_union_with_admin_group() {
        let provider = FakeProvider::new()
            .with_membership("root", "org_admin", "member")
            .with_organization("org_admin", "Admin");
        let store = MemoryStore::new();
        store.upsert_team("Ops", "org_a").await.unwrap();
        store.upsert_team("Finance", "org_a").await.unwrap();
        store.upsert_team("Ops", "org_b").await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);
        let scope = RequestScope::new();

        let groups = resolver.get_user_groups(&scope, "root").await;
        assert_eq!(groups, vec!["Admin", "Finance", "Ops"]);
        assert!(resolver.is_admin(&scope, Some("root")).await);
        assert_eq!(provider.calls("list_memberships"), 1);
    }

    #[tokio::test]
    async fn test_admin_group_not_duplicated_when_team_exists() {
        let provider = FakeProvider::new()
            .with_membership("root", "org_admin", "Admin")
            .with_organization("org_admin", "ADMIN");
        let store = MemoryStore::new();
        store.upsert_team("Ops", "org_a").await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);
        let scope = RequestScope::new();

        let groups = resolver.get_user_groups(&scope, "root").await;
        assert_eq!(groups, vec!["Admin", "Ops"]);
        assert_eq!(groups.iter().filter(|g| *g == ADMIN_GROUP).count(), 1);
        assert!(
            store
                .find_team("Admin", "org_admin")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_admin_org_name_is_configurable() {
        let provider = FakeProvider::new()
            .with_membership("root", "org_1", "member")
            .with_organization("org_1", "Platform Owners");
        let store = MemoryStore::new();
        let settings = PipelineSettings::Fixed(PipelineConfig {
            use_external_org_pipeline: true,
            admin_organization_name: "platform owners".into(),
        });
        let resolver = GroupResolver::new(&provider, &store, &settings);

        assert!(resolver.is_admin(&RequestScope::new(), Some("root")).await);
    }

    #[tokio::test]
    async fn test_sync_creates_missing_teams_and_skips_member() {
        let provider = FakeProvider::new()
            .with_membership("alice", "org_a", "Ops")
            .with_membership("alice", "org_b", "MEMBER")
            .with_membership_role(
                "alice",
                "org_c",
                Some(MembershipRole::Structured {
                    slug: None,
                    name: Some("Field-Tech".into()),
                    id: Some("role_1".into()),
                }),
            )
            .with_membership_role("alice", "org_d", None);
        let store = MemoryStore::new();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);

        let groups = resolver.get_user_groups(&RequestScope::new(), "alice").await;
        assert_eq!(groups, vec!["Ops", "Field-Tech"]);

        let mut names = store.list_team_names().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["Field-Tech", "Ops"]);
        assert!(store.find_team("Ops", "org_a").await.unwrap().is_some());
        assert!(store.find_team("Field-Tech", "org_c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_empty_pipeline_result_uses_local_groups() {
        let provider = FakeProvider::new().with_membership("alice", "org_a", "member");
        let store = MemoryStore::new();
        store.add_user_group("alice", "Legacy").await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);

        let groups = resolver.get_user_groups(&RequestScope::new(), "alice").await;
        assert_eq!(groups, vec!["Legacy"]);
    }

    #[tokio::test]
    async fn test_disabled_pipeline_uses_local_tables() {
        let provider = FakeProvider::new()
            .with_membership("alice", "org_admin", "Ops")
            .with_organization("org_admin", "admin");
        let store = MemoryStore::new();
        store.add_user_group("alice", "Legacy").await.unwrap();
        store.set_user_role("alice", AccessRole::Admin).await.unwrap();
        let settings = disabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);
        let scope = RequestScope::new();

        assert_eq!(resolver.get_user_groups(&scope, "alice").await, vec!["Legacy"]);
        assert_eq!(
            resolver.get_user_role(&scope, Some("alice")).await,
            AccessRole::Admin
        );
        assert_eq!(provider.calls("list_memberships"), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_uses_local_tables() {
        let provider = FakeProvider::new().with_listing_error(503, "service_unavailable");
        let store = MemoryStore::new();
        store.add_user_group("alice", "Legacy").await.unwrap();
        store.set_user_role("alice", AccessRole::Admin).await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);
        let scope = RequestScope::new();

        assert_eq!(resolver.get_user_groups(&scope, "alice").await, vec!["Legacy"]);
        assert!(resolver.is_admin(&scope, Some("alice")).await);
    }

    #[tokio::test]
    async fn test_local_role_never_overrides_memberships() {
        let provider = FakeProvider::new()
            .with_membership("alice", "org_a", "Ops")
            .with_organization("org_a", "Acme");
        let store = MemoryStore::new();
        store.set_user_role("alice", AccessRole::Admin).await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);

        assert!(!resolver.is_admin(&RequestScope::new(), Some("alice")).await);
    }

    #[tokio::test]
    async fn test_not_found_listing_is_not_admin() {
        let provider = FakeProvider::new().with_listing_error(404, "not_found");
        let store = MemoryStore::new();
        store.set_user_role("ghost", AccessRole::Admin).await.unwrap();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);

        assert!(!resolver.is_admin(&RequestScope::new(), Some("ghost")).await);
    }

    #[tokio::test]
    async fn test_store_failure_yields_empty_groups() {
        let provider = FakeProvider::new().with_membership("alice", "org_a", "Ops");
        let store = MemoryStore::new();
        store.set_available(false);
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);
        let scope = RequestScope::new();

        assert!(resolver.get_user_groups(&scope, "alice").await.is_empty());
        assert_eq!(
            resolver.get_user_role(&scope, Some("alice")).await,
            AccessRole::User
        );
    }

    #[tokio::test]
    async fn test_role_defaults_to_session_user() {
        let provider = FakeProvider::new()
            .with_membership("root", "org_admin", "member")
            .with_organization("org_admin", "admin");
        let store = MemoryStore::new();
        let settings = enabled();
        let resolver = GroupResolver::new(&provider, &store, &settings);

        let scope = RequestScope::with_user(SessionUser {
            id: "root".into(),
            email: "root@example.com".into(),
            first_name: None,
            last_name: None,
            profile_picture_url: None,
        });
        assert_eq!(resolver.get_user_role(&scope, None).await, AccessRole::Admin);
        assert!(!resolver.is_admin(&RequestScope::new(), None).await);
    }
}
