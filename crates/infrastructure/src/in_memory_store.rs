use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskflow_application::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, IdentityProvider,
    InvitationRepository, MigrationLogRepository, ProjectRepository, ProjectWrite, WriteOutcome,
};
use taskflow_core::{AppError, AppResult, ProjectId};
use taskflow_domain::{
    EmailAddress, Invitation, InvitationId, InvitationStatus, MigrationLog, ProjectDocument,
    UserProfile,
};
use tokio::sync::RwLock;
use uuid::Uuid;

mod invitations;
mod records;

#[derive(Debug, Clone)]
struct StoredAuditEvent {
    event_id: Uuid,
    event: AuditEvent,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct StoreState {
    projects: HashMap<ProjectId, ProjectDocument>,
    invitations: HashMap<String, Invitation>,
    audit_events: Vec<StoredAuditEvent>,
    migration_logs: HashMap<Uuid, MigrationLog>,
    users: HashMap<String, UserProfile>,
}

/// In-memory adapter implementing every persistence port.
///
/// One lock guards all collections so a project write, its invitation
/// transition and its audit events land together.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user profile directly, bypassing sign-in.
    pub async fn seed_user(&self, profile: UserProfile) {
        self.state
            .write()
            .await
            .users
            .insert(profile.subject.clone(), profile);
    }
}

fn lists_member(document: &ProjectDocument, subject: &str) -> bool {
    document
        .members
        .as_ref()
        .is_some_and(|members| members.iter().any(|member| member == subject))
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn create_project(&self, project: ProjectDocument) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.projects.contains_key(&project.id) {
            return Err(AppError::Conflict(format!(
                "project '{}' already exists",
                project.id
            )));
        }

        state.projects.insert(project.id, project);
        Ok(())
    }

    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<ProjectDocument>> {
        Ok(self.state.read().await.projects.get(&project_id).cloned())
    }

    async fn list_projects_for_member(&self, subject: &str) -> AppResult<Vec<ProjectDocument>> {
        Ok(self
            .state
            .read()
            .await
            .projects
            .values()
            .filter(|document| {
                document.owner.as_deref() == Some(subject) || lists_member(document, subject)
            })
            .cloned()
            .collect())
    }

    async fn list_projects_owned_by(&self, subject: &str) -> AppResult<Vec<ProjectDocument>> {
        let state = self.state.read().await;
        let mut documents: Vec<ProjectDocument> = state
            .projects
            .values()
            .filter(|document| match document.owner.as_deref() {
                Some(owner) => owner == subject,
                None => lists_member(document, subject),
            })
            .cloned()
            .collect();
        documents.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        Ok(documents)
    }

    async fn commit_project_write(&self, write: ProjectWrite) -> AppResult<WriteOutcome> {
        let mut state = self.state.write().await;
        let project_id = write.project.id;

        let Some(current) = state.projects.get(&project_id) else {
            return Err(AppError::NotFound(format!(
                "project '{project_id}' does not exist"
            )));
        };
        if current.revision != write.expected_revision {
            return Ok(WriteOutcome::RevisionConflict);
        }

        if let Some(invitation) = write.invitation.as_ref()
            && !state
                .invitations
                .get(invitation.id.as_str())
                .is_some_and(|stored| stored.status == InvitationStatus::Pending)
        {
            return Ok(WriteOutcome::InvitationNotPending);
        }

        let mut project = write.project;
        project.revision = write.expected_revision + 1;
        state.projects.insert(project_id, project);

        if let Some(invitation) = write.invitation {
            state
                .invitations
                .insert(invitation.id.as_str().to_owned(), invitation);
        }

        let now = Utc::now();
        state
            .audit_events
            .extend(write.audit_events.into_iter().map(|event| StoredAuditEvent {
                event_id: Uuid::new_v4(),
                event,
                created_at: now,
            }));

        Ok(WriteOutcome::Committed)
    }
}
