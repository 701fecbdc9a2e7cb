use std::sync::Arc;

use chrono::Utc;
use taskflow_core::{AppError, AppResult, ProjectId, UserIdentity};
use taskflow_domain::{MemberAccess, Project};
use tracing::warn;

use crate::ProjectRepository;
use crate::project_writes::project_not_found;

/// Input payload for creating a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProjectInput {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
}

/// Project together with the caller's access to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAccessView {
    /// Project.
    pub project: Project,
    /// Caller access.
    pub access: MemberAccess,
}

/// Application service for project creation and lookup.
#[derive(Clone)]
pub struct ProjectService {
    repository: Arc<dyn ProjectRepository>,
}

impl ProjectService {
    /// Creates a new project service.
    #[must_use]
    pub fn new(repository: Arc<dyn ProjectRepository>) -> Self {
        Self { repository }
    }

    /// Creates a project owned by the actor.
    pub async fn create_project(
        &self,
        actor: &UserIdentity,
        input: CreateProjectInput,
    ) -> AppResult<Project> {
        let project = Project::new(actor.subject(), input.name, input.description, Utc::now())?;
        self.repository
            .create_project(project.clone().into_document(1))
            .await?;

        Ok(project)
    }

    /// Lists projects the actor owns or is a member of.
    ///
    /// Documents too malformed to evaluate are skipped.
    pub async fn list_my_projects(&self, actor: &UserIdentity) -> AppResult<Vec<ProjectAccessView>> {
        let documents = self
            .repository
            .list_projects_for_member(actor.subject())
            .await?;

        let mut views = Vec::with_capacity(documents.len());
        for document in documents {
            let project_id = document.id;
            match Project::from_document(document) {
                Ok(project) => views.push(ProjectAccessView {
                    access: project.access_of(actor.subject()),
                    project,
                }),
                Err(error) => warn!(%project_id, %error, "skipping unreadable project"),
            }
        }

        views.sort_by(|left, right| right.project.updated_at().cmp(&left.project.updated_at()));
        Ok(views)
    }

    /// Returns one project the actor belongs to.
    pub async fn get_project(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
    ) -> AppResult<ProjectAccessView> {
        let document = self
            .repository
            .find_project(project_id)
            .await?
            .ok_or_else(|| project_not_found(project_id))?;
        let project = Project::from_document(document)?;

        let access = project.access_of(actor.subject());
        if access == MemberAccess::NotMember {
            return Err(AppError::Forbidden(format!(
                "subject '{}' is not a member of project '{project_id}'",
                actor.subject()
            )));
        }

        Ok(ProjectAccessView { project, access })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use taskflow_core::AppError;
    use taskflow_domain::{MemberAccess, ProjectRole};

    use crate::test_support::{FakeStore, identity};

    use super::{CreateProjectInput, ProjectService};

    #[tokio::test]
    async fn created_project_lists_owner_as_only_member() {
        let store = Arc::new(FakeStore::default());
        let service = ProjectService::new(store.clone());
        let owner = identity("u1", "u1@x.com");

        let project = service
            .create_project(
                &owner,
                CreateProjectInput {
                    name: "Roadmap".to_owned(),
                    description: "Q3".to_owned(),
                },
            )
            .await;
        assert!(project.is_ok());

        let project = project.unwrap_or_else(|_| unreachable!());
        let stored = store.document(project.id()).await;
        assert_eq!(stored.owner.as_deref(), Some("u1"));
        assert_eq!(stored.members, Some(vec!["u1".to_owned()]));
        assert_eq!(stored.member_roles.map(|roles| roles.len()), Some(0));
    }

    #[tokio::test]
    async fn blank_project_name_is_rejected() {
        let service = ProjectService::new(Arc::new(FakeStore::default()));

        let result = service
            .create_project(
                &identity("u1", "u1@x.com"),
                CreateProjectInput {
                    name: "  ".to_owned(),
                    description: String::new(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn get_project_reports_access_and_rejects_outsiders() {
        let store = Arc::new(FakeStore::default());
        let project_id = store
            .insert_project("u1", &[("u2", ProjectRole::Viewer)])
            .await;
        let service = ProjectService::new(store);

        let view = service
            .get_project(&identity("u2", "u2@x.com"), project_id)
            .await;
        assert!(matches!(
            view.map(|view| view.access),
            Ok(MemberAccess::Role(ProjectRole::Viewer))
        ));

        let outsider = service
            .get_project(&identity("u9", "u9@x.com"), project_id)
            .await;
        assert!(matches!(outsider, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn list_my_projects_skips_documents_without_owner() {
        let store = Arc::new(FakeStore::default());
        store
            .insert_project("u1", &[("u2", ProjectRole::Editor)])
            .await;
        store.insert_legacy_project(None, Some(vec!["u2"])).await;
        let service = ProjectService::new(store);

        let projects = service
            .list_my_projects(&identity("u2", "u2@x.com"))
            .await
            .unwrap_or_default();
        assert_eq!(projects.len(), 1);
    }
}
