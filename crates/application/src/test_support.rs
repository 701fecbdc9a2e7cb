//! Shared fakes for service tests.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use taskflow_core::{AppError, AppResult, ProjectId, UserIdentity};
use taskflow_domain::{
    EmailAddress, Invitation, InvitationId, InvitationStatus, MigrationLog, Project,
    ProjectDocument, ProjectRole, UserProfile,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, IdentityProvider,
    InvitationRepository, MigrationLogRepository, ProjectRepository, ProjectWrite, WriteOutcome,
};

#[derive(Default)]
pub(crate) struct FakeStore {
    pub projects: Mutex<HashMap<ProjectId, ProjectDocument>>,
    pub invitations: Mutex<HashMap<String, Invitation>>,
    pub audit_events: Mutex<Vec<AuditEvent>>,
    pub migration_logs: Mutex<Vec<MigrationLog>>,
    pub users: Mutex<HashMap<String, UserProfile>>,
    pub forced_conflicts: Mutex<usize>,
    pub failing_commits: Mutex<Vec<ProjectId>>,
}

impl FakeStore {
    pub async fn add_user(&self, subject: &str, email: &str) {
        self.users.lock().await.insert(
            subject.to_owned(),
            UserProfile {
                subject: subject.to_owned(),
                email: Some(email.to_owned()),
                display_name: subject.to_uppercase(),
            },
        );
    }

    pub async fn insert_document(&self, document: ProjectDocument) -> ProjectId {
        let project_id = document.id;
        self.projects.lock().await.insert(project_id, document);
        project_id
    }

    /// Stores a migrated project owned by `owner` with the given members.
    pub async fn insert_project(&self, owner: &str, members: &[(&str, ProjectRole)]) -> ProjectId {
        let now = Utc::now();
        let mut project = Project::new(owner, "Roadmap", "", now).unwrap_or_else(|_| unreachable!());
        for (subject, role) in members {
            project
                .add_member(subject, *role, now)
                .unwrap_or_else(|_| unreachable!());
        }

        self.insert_document(project.into_document(1)).await
    }

    pub async fn insert_legacy_project(
        &self,
        owner: Option<&str>,
        members: Option<Vec<&str>>,
    ) -> ProjectId {
        let now = Utc::now();
        self.insert_document(ProjectDocument {
            id: ProjectId::new(),
            name: "Legacy".to_owned(),
            description: String::new(),
            owner: owner.map(ToOwned::to_owned),
            members: members.map(|values| values.into_iter().map(ToOwned::to_owned).collect()),
            member_roles: None,
            boards: Vec::new(),
            created_at: now,
            updated_at: now,
            migrated_at: None,
            revision: 1,
        })
        .await
    }

    pub async fn delete_project(&self, project_id: ProjectId) {
        self.projects.lock().await.remove(&project_id);
    }

    pub async fn document(&self, project_id: ProjectId) -> ProjectDocument {
        self.projects
            .lock()
            .await
            .get(&project_id)
            .cloned()
            .unwrap_or_else(|| unreachable!())
    }

    pub async fn invitation(&self, invitation_id: &str) -> Invitation {
        self.invitations
            .lock()
            .await
            .get(invitation_id)
            .cloned()
            .unwrap_or_else(|| unreachable!())
    }

    pub async fn expire_invitation(&self, invitation_id: &str, expires_at: DateTime<Utc>) {
        if let Some(invitation) = self.invitations.lock().await.get_mut(invitation_id) {
            invitation.expires_at = expires_at;
        }
    }
}

pub(crate) fn identity(subject: &str, email: &str) -> UserIdentity {
    UserIdentity::new(subject, subject.to_uppercase(), Some(email.to_owned()))
}

#[async_trait]
impl ProjectRepository for FakeStore {
    async fn create_project(&self, project: ProjectDocument) -> AppResult<()> {
        self.projects.lock().await.insert(project.id, project);
        Ok(())
    }

    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<ProjectDocument>> {
        Ok(self.projects.lock().await.get(&project_id).cloned())
    }

    async fn list_projects_for_member(&self, subject: &str) -> AppResult<Vec<ProjectDocument>> {
        Ok(self
            .projects
            .lock()
            .await
            .values()
            .filter(|document| {
                document.owner.as_deref() == Some(subject)
                    || document
                        .members
                        .as_ref()
                        .is_some_and(|members| members.iter().any(|member| member == subject))
            })
            .cloned()
            .collect())
    }

    async fn list_projects_owned_by(&self, subject: &str) -> AppResult<Vec<ProjectDocument>> {
        Ok(self
            .projects
            .lock()
            .await
            .values()
            .filter(|document| match document.owner.as_deref() {
                Some(owner) => owner == subject,
                None => document
                    .members
                    .as_ref()
                    .is_some_and(|members| members.iter().any(|member| member == subject)),
            })
            .cloned()
            .collect())
    }

    async fn commit_project_write(&self, write: ProjectWrite) -> AppResult<WriteOutcome> {
        if self.failing_commits.lock().await.contains(&write.project.id) {
            return Err(AppError::Internal("simulated write failure".to_owned()));
        }

        {
            let mut forced_conflicts = self.forced_conflicts.lock().await;
            if *forced_conflicts > 0 {
                *forced_conflicts -= 1;
                return Ok(WriteOutcome::RevisionConflict);
            }
        }

        let mut projects = self.projects.lock().await;
        let mut invitations = self.invitations.lock().await;

        let Some(current) = projects.get(&write.project.id) else {
            return Err(AppError::NotFound("project not found".to_owned()));
        };
        if current.revision != write.expected_revision {
            return Ok(WriteOutcome::RevisionConflict);
        }

        if let Some(invitation) = write.invitation.as_ref() {
            let still_pending = invitations
                .get(invitation.id.as_str())
                .is_some_and(|stored| stored.status == InvitationStatus::Pending);
            if !still_pending {
                return Ok(WriteOutcome::InvitationNotPending);
            }
        }

        let mut project = write.project;
        project.revision = write.expected_revision + 1;
        projects.insert(project.id, project);
        if let Some(invitation) = write.invitation {
            invitations.insert(invitation.id.as_str().to_owned(), invitation);
        }
        self.audit_events.lock().await.extend(write.audit_events);

        Ok(WriteOutcome::Committed)
    }
}

#[async_trait]
impl InvitationRepository for FakeStore {
    async fn create_pending_invitation(&self, invitation: Invitation) -> AppResult<()> {
        let mut invitations = self.invitations.lock().await;
        let mut duplicate = false;
        for stored in invitations.values_mut().filter(|stored| {
            stored.status == InvitationStatus::Pending
                && stored.project_id == invitation.project_id
                && stored.invitee_email == invitation.invitee_email
        }) {
            if stored.is_expired(invitation.created_at) {
                stored.status = InvitationStatus::Declined;
                stored.declined_at = Some(invitation.created_at);
            } else {
                duplicate = true;
            }
        }
        if duplicate || invitations.contains_key(invitation.id.as_str()) {
            return Err(AppError::Conflict("pending invitation exists".to_owned()));
        }

        invitations.insert(invitation.id.as_str().to_owned(), invitation);
        Ok(())
    }

    async fn find_invitation(
        &self,
        invitation_id: &InvitationId,
    ) -> AppResult<Option<Invitation>> {
        Ok(self
            .invitations
            .lock()
            .await
            .get(invitation_id.as_str())
            .cloned())
    }

    async fn find_pending_invitation(
        &self,
        project_id: ProjectId,
        invitee_email: &EmailAddress,
    ) -> AppResult<Option<Invitation>> {
        Ok(self
            .invitations
            .lock()
            .await
            .values()
            .find(|stored| {
                stored.status == InvitationStatus::Pending
                    && stored.project_id == project_id
                    && &stored.invitee_email == invitee_email
            })
            .cloned())
    }

    async fn list_pending_invitations_for_invitee(
        &self,
        invitee_email: Option<&EmailAddress>,
        invitee_subject: &str,
    ) -> AppResult<Vec<Invitation>> {
        Ok(self
            .invitations
            .lock()
            .await
            .values()
            .filter(|stored| {
                stored.status == InvitationStatus::Pending
                    && (invitee_email.is_some_and(|email| &stored.invitee_email == email)
                        || stored.invitee_subject.as_deref() == Some(invitee_subject))
            })
            .cloned()
            .collect())
    }

    async fn record_decision(&self, invitation: &Invitation) -> AppResult<bool> {
        let mut invitations = self.invitations.lock().await;
        let Some(stored) = invitations.get_mut(invitation.id.as_str()) else {
            return Ok(false);
        };
        if stored.status != InvitationStatus::Pending {
            return Ok(false);
        }

        *stored = invitation.clone();
        Ok(true)
    }
}

#[async_trait]
impl AuditLogRepository for FakeStore {
    async fn list_recent_entries(
        &self,
        project_id: ProjectId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        Ok(self
            .audit_events
            .lock()
            .await
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, event)| event.project_id == project_id)
            .skip(query.offset)
            .take(query.limit)
            .map(|(index, event)| AuditLogEntry {
                event_id: index.to_string(),
                project_id: event.project_id,
                subject: event.subject.clone(),
                action: event.action,
                target_subject: event.target_subject.clone(),
                old_role: event.old_role,
                new_role: event.new_role,
                removed_role: event.removed_role,
                detail: event.detail.clone(),
                created_at: Utc::now().to_rfc3339(),
            })
            .collect())
    }
}

#[async_trait]
impl MigrationLogRepository for FakeStore {
    async fn create_migration_log(&self, log: &MigrationLog) -> AppResult<()> {
        self.migration_logs.lock().await.push(log.clone());
        Ok(())
    }

    async fn save_migration_log(&self, log: &MigrationLog) -> AppResult<()> {
        let mut logs = self.migration_logs.lock().await;
        let Some(stored) = logs.iter_mut().find(|stored| stored.id == log.id) else {
            return Err(AppError::NotFound("migration log not found".to_owned()));
        };

        *stored = log.clone();
        Ok(())
    }

    async fn find_migration_log(&self, migration_id: Uuid) -> AppResult<Option<MigrationLog>> {
        Ok(self
            .migration_logs
            .lock()
            .await
            .iter()
            .find(|log| log.id == migration_id)
            .cloned())
    }

    async fn list_migration_logs_for_subject(
        &self,
        subject: &str,
        limit: usize,
    ) -> AppResult<Vec<MigrationLog>> {
        let mut logs: Vec<MigrationLog> = self
            .migration_logs
            .lock()
            .await
            .iter()
            .filter(|log| log.subject == subject)
            .cloned()
            .collect();
        logs.sort_by(|left, right| right.started_at.cmp(&left.started_at));
        logs.truncate(limit);
        Ok(logs)
    }
}

#[async_trait]
impl IdentityProvider for FakeStore {
    async fn resolve_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|profile| {
                profile
                    .email
                    .as_deref()
                    .is_some_and(|value| email.matches(value))
            })
            .map(|profile| profile.subject.clone()))
    }

    async fn resolve_user_by_id(&self, subject: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.users.lock().await.get(subject).cloned())
    }

    async fn upsert_user(&self, profile: UserProfile) -> AppResult<()> {
        self.users
            .lock()
            .await
            .insert(profile.subject.clone(), profile);
        Ok(())
    }
}

pub(crate) fn roles(entries: &[(&str, ProjectRole)]) -> BTreeMap<String, ProjectRole> {
    entries
        .iter()
        .map(|(subject, role)| ((*subject).to_owned(), *role))
        .collect()
}
