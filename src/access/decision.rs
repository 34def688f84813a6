//! Document and file access decisions.
//!
//! Both checks sit on top of the group pipeline. They differ in how an
//! unexpected store failure is treated, see [`FailurePolicy`].

use super::RequestScope;
use super::groups::GroupResolver;
use crate::config::PipelineSettings;
use crate::identity::IdentityProvider;
use crate::ocsf;
use crate::store::{DocumentKind, FileRecord, Store, StoreError, Visibility};

/// What a decision point answers when the store fails underneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Grant access. A product decision: a store outage must not lock
    /// users out of their documents.
    FailOpenOnUnexpectedError,
    /// Refuse, and report the failure to the caller.
    FailClosed,
}

pub const DOCUMENT_ACCESS_POLICY: FailurePolicy = FailurePolicy::FailOpenOnUnexpectedError;
pub const FILE_MODIFY_POLICY: FailurePolicy = FailurePolicy::FailClosed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileDecision {
    Allowed,
    Denied,
    NotFound,
    /// The store failed; nothing was decided.
    Error,
}

impl FileDecision {
    pub fn can_modify(self) -> bool {
        self == FileDecision::Allowed
    }
}

pub struct AccessDecisions<'a, P, S> {
    groups: GroupResolver<'a, P, S>,
    store: &'a S,
}

impl<'a, P: IdentityProvider, S: Store> AccessDecisions<'a, P, S> {
    pub fn new(provider: &'a P, store: &'a S, settings: &'a PipelineSettings) -> Self {
        Self {
            groups: GroupResolver::new(provider, store, settings),
            store,
        }
    }

    /// Whether `user_id` may read `document_id`.
    pub async fn can_access_document(
        &self,
        scope: &RequestScope,
        user_id: &str,
        document_id: &str,
    ) -> bool {
        let (allowed, reason) = match self.document_access(scope, user_id, document_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(user_id, document_id, error = %e, "document access check failed");
                match DOCUMENT_ACCESS_POLICY {
                    FailurePolicy::FailOpenOnUnexpectedError => (true, "store error, fail open"),
                    FailurePolicy::FailClosed => (false, "store error"),
                }
            }
        };
        audit("document:read", document_id, allowed, reason, user_id);
        allowed
    }

    /// Whether `user_id` may modify `file_id`.
    pub async fn check_file_permission(
        &self,
        scope: &RequestScope,
        user_id: &str,
        file_id: &str,
    ) -> FileDecision {
        let (decision, reason) = match self.file_permission(scope, user_id, file_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(user_id, file_id, error = %e, "file permission check failed");
                match FILE_MODIFY_POLICY {
                    FailurePolicy::FailOpenOnUnexpectedError => {
                        (FileDecision::Allowed, "store error, fail open")
                    }
                    FailurePolicy::FailClosed => (FileDecision::Error, "store error"),
                }
            }
        };
        if decision != FileDecision::NotFound {
            audit("file:modify", file_id, decision.can_modify(), reason, user_id);
        }
        decision
    }

    async fn document_access(
        &self,
        scope: &RequestScope,
        user_id: &str,
        document_id: &str,
    ) -> Result<(bool, &'static str), StoreError> {
        let Some(document) = self.store.get_document(document_id).await? else {
            return Ok((false, "unknown document"));
        };
        match document.kind {
            DocumentKind::Base => Ok((true, "base document")),
            DocumentKind::Team => self.team_document_access(scope, user_id, document_id).await,
        }
    }

    async fn team_document_access(
        &self,
        scope: &RequestScope,
        user_id: &str,
        document_id: &str,
    ) -> Result<(bool, &'static str), StoreError> {
        if self.groups.is_admin(scope, Some(user_id)).await {
            return Ok((true, "admin"));
        }
        let access_groups = self.store.document_access_groups(document_id).await?;
        let groups = self.groups.get_user_groups(scope, user_id).await;
        if groups.iter().any(|g| access_groups.contains(g)) {
            Ok((true, "shared group"))
        } else {
            Ok((false, "no shared group"))
        }
    }

    async fn file_permission(
        &self,
        scope: &RequestScope,
        user_id: &str,
        file_id: &str,
    ) -> Result<(FileDecision, &'static str), StoreError> {
        let Some(file) = self.store.get_file(file_id).await? else {
            return Ok((FileDecision::NotFound, "unknown file"));
        };

        if self.groups.is_admin(scope, Some(user_id)).await {
            return Ok((FileDecision::Allowed, "admin"));
        }
        if file.uploaded_by.as_deref() == Some(user_id) {
            return Ok((FileDecision::Allowed, "uploader"));
        }

        let (allowed, reason) = match (&file.document_id, &file.application_id) {
            (Some(document_id), _) => self.document_file(scope, user_id, &file, document_id).await?,
            (None, Some(_)) => self.application_file(scope, user_id, &file).await,
            (None, None) => (false, "orphan file"),
        };
        let decision = if allowed {
            FileDecision::Allowed
        } else {
            FileDecision::Denied
        };
        Ok((decision, reason))
    }

    async fn document_file(
        &self,
        scope: &RequestScope,
        user_id: &str,
        file: &FileRecord,
        document_id: &str,
    ) -> Result<(bool, &'static str), StoreError> {
        let Some(document) = self.store.get_document(document_id).await? else {
            return Ok((false, "unknown document"));
        };
        match document.kind {
            DocumentKind::Team => self.team_document_access(scope, user_id, document_id).await,
            DocumentKind::Base if file.uploaded_by.is_none() => Ok((true, "base document")),
            DocumentKind::Base => Ok((false, "uploaded by another user")),
        }
    }

    async fn application_file(
        &self,
        scope: &RequestScope,
        user_id: &str,
        file: &FileRecord,
    ) -> (bool, &'static str) {
        match (file.visibility, file.team_name.as_deref()) {
            (Visibility::Team, Some(team)) => {
                let groups = self.groups.get_user_groups(scope, user_id).await;
                if groups.iter().any(|g| g == team) {
                    (true, "team member")
                } else {
                    (false, "not a team member")
                }
            }
            (Visibility::Team, None) => (false, "team file without team"),
            (Visibility::Public, _) => (false, "uploader only"),
            (Visibility::Private, _) => (false, "private"),
        }
    }
}

fn audit(action: &str, resource_id: &str, allowed: bool, reason: &str, user_id: &str) {
    let (decision, severity) = if allowed {
        (ocsf::DECISION_PERMIT, ocsf::SEVERITY_INFORMATIONAL)
    } else {
        (ocsf::DECISION_DENY, ocsf::SEVERITY_MEDIUM)
    };
    ocsf::authorization_event(action, resource_id, decision, reason, severity, Some(user_id));
}
