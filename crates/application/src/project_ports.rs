use async_trait::async_trait;

use taskflow_core::{AppResult, ProjectId};
use taskflow_domain::{Invitation, ProjectDocument};

use crate::AuditEvent;

/// Conditional write covering one project and its side effects.
///
/// The write succeeds only when the stored revision equals
/// `expected_revision` and, when an invitation transition is attached, the
/// stored invitation is still pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWrite {
    /// New project state; its `revision` is ignored and replaced by the store.
    pub project: ProjectDocument,
    /// Revision read before computing the new state.
    pub expected_revision: i64,
    /// Invitation transition committed with the project.
    pub invitation: Option<Invitation>,
    /// Audit events appended with the project.
    pub audit_events: Vec<AuditEvent>,
}

/// Result of a conditional project write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Everything was persisted.
    Committed,
    /// The project changed since it was read; nothing was persisted.
    RevisionConflict,
    /// The attached invitation is no longer pending; nothing was persisted.
    InvitationNotPending,
}

/// Repository port for project documents.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Persists a newly created project.
    async fn create_project(&self, project: ProjectDocument) -> AppResult<()>;

    /// Finds a project document by id.
    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<ProjectDocument>>;

    /// Lists projects where the subject is the owner or a listed member.
    async fn list_projects_for_member(&self, subject: &str) -> AppResult<Vec<ProjectDocument>>;

    /// Lists projects owned by the subject.
    ///
    /// Projects without an owner that list the subject as a member are
    /// included so migration can report them as invalid.
    async fn list_projects_owned_by(&self, subject: &str) -> AppResult<Vec<ProjectDocument>>;

    /// Commits one conditional project write.
    async fn commit_project_write(&self, write: ProjectWrite) -> AppResult<WriteOutcome>;
}
