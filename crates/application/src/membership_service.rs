use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use taskflow_core::{AppError, AppResult, ProjectId, UserIdentity};
use taskflow_domain::{
    AuditAction, Permission, Project, ProjectRole, RoleGrantPolicy, UNKNOWN_MEMBER_DISPLAY_NAME,
    can_modify_role,
};

use crate::authorization_service::ensure_permission;
use crate::project_writes::{StagedWrite, commit_with_retry, project_not_found};
use crate::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, IdentityProvider, ProjectRepository};

mod audit;
mod listing;
mod removal;
mod roles;

/// Resolved member projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMember {
    /// Member user id.
    pub subject: String,
    /// Email, `None` when the identity could not be resolved.
    pub email: Option<String>,
    /// Display name or a placeholder.
    pub display_name: String,
    /// Member role, `None` on legacy projects.
    pub role: Option<ProjectRole>,
}

/// Outcome of a role change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    /// Role before the change.
    pub previous_role: ProjectRole,
    /// Role after the change.
    pub new_role: ProjectRole,
    /// Human-readable confirmation.
    pub message: String,
}

/// Application service for role changes, removals and member listings.
#[derive(Clone)]
pub struct MembershipService {
    project_repository: Arc<dyn ProjectRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
    identity_provider: Arc<dyn IdentityProvider>,
    grant_policy: RoleGrantPolicy,
}

impl MembershipService {
    /// Creates a new membership service using the strict grant policy.
    #[must_use]
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            project_repository,
            audit_log_repository,
            identity_provider,
            grant_policy: RoleGrantPolicy::default(),
        }
    }

    /// Overrides the rule deciding which roles actors may grant.
    #[must_use]
    pub fn with_grant_policy(mut self, grant_policy: RoleGrantPolicy) -> Self {
        self.grant_policy = grant_policy;
        self
    }

    async fn load_project(&self, project_id: ProjectId) -> AppResult<Project> {
        let document = self
            .project_repository
            .find_project(project_id)
            .await?
            .ok_or_else(|| project_not_found(project_id))?;

        Project::from_document(document)
    }
}

fn parse_target(actor: &UserIdentity, target_subject: &str) -> AppResult<String> {
    let target_subject = target_subject.trim();
    if target_subject.is_empty() {
        return Err(AppError::Validation("target user id is required".to_owned()));
    }

    if target_subject == actor.subject() {
        return Err(AppError::Validation(
            "you cannot change your own membership".to_owned(),
        ));
    }

    Ok(target_subject.to_owned())
}

/// Resolves a non-owner member's role; `None` for a listed member without one.
fn member_target(project: &Project, target_subject: &str) -> AppResult<Option<ProjectRole>> {
    if project.owner() == target_subject {
        return Err(AppError::Forbidden(
            "the project owner cannot be modified".to_owned(),
        ));
    }

    if !project.is_member(target_subject) {
        return Err(AppError::NotFound(format!(
            "user '{target_subject}' is not a member of project '{}'",
            project.id()
        )));
    }

    Ok(project.role_of(target_subject))
}

fn target_role(project: &Project, target_subject: &str) -> AppResult<ProjectRole> {
    member_target(project, target_subject)?.ok_or_else(|| {
        AppError::NotFound(format!(
            "user '{target_subject}' has no role in project '{}'",
            project.id()
        ))
    })
}
