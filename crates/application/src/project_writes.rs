use taskflow_core::{AppError, AppResult, ProjectId};
use taskflow_domain::{Invitation, Project, ProjectDocument};
use tracing::debug;

use crate::{AuditEvent, ProjectRepository, ProjectWrite, WriteOutcome};

/// Attempts per mutation before a revision conflict is surfaced.
pub(crate) const MAX_WRITE_ATTEMPTS: usize = 3;

/// New state computed from one read of a project.
pub(crate) struct StagedWrite<T> {
    /// Project to persist; `None` ends the mutation without writing.
    pub project: Option<Project>,
    /// Invitation transition committed with the project.
    pub invitation: Option<Invitation>,
    /// Audit events appended with the project.
    pub audit_events: Vec<AuditEvent>,
    /// Value returned to the caller once committed.
    pub output: T,
}

impl<T> StagedWrite<T> {
    /// Stages a project write without side effects.
    pub(crate) fn project(project: Project, output: T) -> Self {
        Self {
            project: Some(project),
            invitation: None,
            audit_events: Vec::new(),
            output,
        }
    }

    /// Ends the mutation without writing.
    pub(crate) fn unchanged(output: T) -> Self {
        Self {
            project: None,
            invitation: None,
            audit_events: Vec::new(),
            output,
        }
    }

    pub(crate) fn with_invitation(mut self, invitation: Invitation) -> Self {
        self.invitation = Some(invitation);
        self
    }

    pub(crate) fn with_audit_event(mut self, event: AuditEvent) -> Self {
        self.audit_events.push(event);
        self
    }
}

pub(crate) fn project_not_found(project_id: ProjectId) -> AppError {
    AppError::NotFound(format!("project '{project_id}' does not exist"))
}

/// Reads the project, stages the new state and commits it conditionally.
///
/// `stage` runs against a fresh read on every attempt.
pub(crate) async fn commit_with_retry<T, F>(
    repository: &dyn ProjectRepository,
    project_id: ProjectId,
    mut stage: F,
) -> AppResult<T>
where
    F: FnMut(ProjectDocument) -> AppResult<StagedWrite<T>> + Send,
    T: Send,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let document = repository
            .find_project(project_id)
            .await?
            .ok_or_else(|| project_not_found(project_id))?;
        let expected_revision = document.revision;

        let staged = stage(document)?;
        let Some(project) = staged.project else {
            return Ok(staged.output);
        };

        let outcome = repository
            .commit_project_write(ProjectWrite {
                project: project.into_document(expected_revision + 1),
                expected_revision,
                invitation: staged.invitation,
                audit_events: staged.audit_events,
            })
            .await?;

        match outcome {
            WriteOutcome::Committed => return Ok(staged.output),
            WriteOutcome::InvitationNotPending => {
                return Err(AppError::Validation(
                    "invitation has already been answered".to_owned(),
                ));
            }
            WriteOutcome::RevisionConflict => {
                debug!(%project_id, attempt, "project revision changed; retrying write");
            }
        }
    }

    Err(AppError::Internal(format!(
        "project '{project_id}' changed concurrently {MAX_WRITE_ATTEMPTS} times; write abandoned"
    )))
}
