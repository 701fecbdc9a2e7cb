use std::sync::Arc;

use taskflow_core::{AppError, AppResult, ProjectId, UserIdentity};
use taskflow_domain::{MemberAccess, Permission, Project, ProjectRole};

use crate::ProjectRepository;
use crate::project_writes::project_not_found;

/// Application service for project-scoped authorization checks.
///
/// Task, board and column handlers call this before touching project data.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn ProjectRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    /// Ensures the actor holds the permission and returns the project.
    pub async fn require_project_permission(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        permission: Permission,
    ) -> AppResult<Project> {
        let project = self.load_project(project_id).await?;
        ensure_permission(&project, actor.subject(), permission)?;
        Ok(project)
    }

    /// Returns whether the actor currently holds the permission.
    pub async fn has_project_permission(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        permission: Permission,
    ) -> AppResult<bool> {
        let project = self.load_project(project_id).await?;
        Ok(project.has_permission(actor.subject(), permission))
    }

    /// Returns the actor's role in the project, if any.
    pub async fn project_role(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<Option<ProjectRole>> {
        let project = self.load_project(project_id).await?;
        Ok(project.role_of(actor.subject()))
    }

    async fn load_project(&self, project_id: ProjectId) -> AppResult<Project> {
        let document = self
            .repository
            .find_project(project_id)
            .await?
            .ok_or_else(|| project_not_found(project_id))?;

        Project::from_document(document)
    }
}

/// Fails with `Forbidden` unless the subject's role grants the permission.
pub(crate) fn ensure_permission(
    project: &Project,
    subject: &str,
    permission: Permission,
) -> AppResult<ProjectRole> {
    match project.access_of(subject) {
        MemberAccess::Role(role) if role.has_permission(permission) => Ok(role),
        MemberAccess::Role(role) => Err(AppError::Forbidden(format!(
            "role '{}' is missing permission '{}' in project '{}'",
            role.as_str(),
            permission.as_str(),
            project.id()
        ))),
        MemberAccess::MigrationRequired => Err(AppError::Forbidden(format!(
            "project '{}' must be migrated before member permissions apply",
            project.id()
        ))),
        MemberAccess::NotMember => Err(AppError::Forbidden(format!(
            "subject '{subject}' is not a member of project '{}'",
            project.id()
        ))),
    }
}
