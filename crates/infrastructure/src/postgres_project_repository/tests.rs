use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use taskflow_application::{
    AuditEvent, AuditLogQuery, AuditLogRepository, InvitationRepository, ProjectRepository,
    ProjectWrite, WriteOutcome,
};
use taskflow_domain::{
    AuditAction, EmailAddress, Invitation, InvitationDraft, Project, ProjectRole,
};

use super::PostgresProjectRepository;
use crate::{PostgresAuditLogRepository, PostgresInvitationRepository};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres project tests: {error}");
    }

    Some(pool)
}

fn new_project(owner: &str) -> Project {
    Project::new(owner, "Roadmap", "", Utc::now()).unwrap_or_else(|_| unreachable!())
}

#[tokio::test]
async fn create_find_and_list_projects() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresProjectRepository::new(pool);
    let owner = format!("owner-{}", uuid::Uuid::new_v4());
    let project = new_project(owner.as_str());
    let project_id = project.id();

    assert!(
        repository
            .create_project(project.into_document(1))
            .await
            .is_ok()
    );

    let found = repository.find_project(project_id).await;
    assert!(matches!(
        found,
        Ok(Some(ref document)) if document.owner.as_deref() == Some(owner.as_str())
            && document.member_roles.as_ref().is_some_and(|roles| roles.is_empty())
    ));

    let owned = repository
        .list_projects_owned_by(owner.as_str())
        .await
        .unwrap_or_default();
    assert_eq!(owned.len(), 1);
}

#[tokio::test]
async fn stale_revision_is_reported_as_conflict() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresProjectRepository::new(pool);
    let mut project = new_project("stale-owner");
    let project_id = project.id();
    assert!(
        repository
            .create_project(project.clone().into_document(1))
            .await
            .is_ok()
    );

    assert!(
        project
            .add_member("member-a", ProjectRole::Editor, Utc::now())
            .is_ok()
    );
    let first = repository
        .commit_project_write(ProjectWrite {
            project: project.clone().into_document(2),
            expected_revision: 1,
            invitation: None,
            audit_events: Vec::new(),
        })
        .await;
    assert!(matches!(first, Ok(WriteOutcome::Committed)));

    let stale = repository
        .commit_project_write(ProjectWrite {
            project: project.into_document(2),
            expected_revision: 1,
            invitation: None,
            audit_events: Vec::new(),
        })
        .await;
    assert!(matches!(stale, Ok(WriteOutcome::RevisionConflict)));

    let stored = repository.find_project(project_id).await;
    assert!(matches!(stored, Ok(Some(document)) if document.revision == 2));
}

#[tokio::test]
async fn accepted_invitation_commits_with_project_and_audit() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let projects = PostgresProjectRepository::new(pool.clone());
    let invitations = PostgresInvitationRepository::new(pool.clone());
    let audit = PostgresAuditLogRepository::new(pool);

    let mut project = new_project("invite-owner");
    let project_id = project.id();
    assert!(
        projects
            .create_project(project.clone().into_document(1))
            .await
            .is_ok()
    );

    let now = Utc::now();
    let invitation = Invitation::issue(
        InvitationDraft {
            project_id,
            project_name: "Roadmap".to_owned(),
            inviter_subject: "invite-owner".to_owned(),
            inviter_email: None,
            invitee_email: EmailAddress::new("bob@x.com").unwrap_or_else(|_| unreachable!()),
            invitee_subject: None,
            role: ProjectRole::Viewer,
        },
        now,
        Duration::days(7),
    )
    .unwrap_or_else(|_| unreachable!());
    assert!(
        invitations
            .create_pending_invitation(invitation.clone())
            .await
            .is_ok()
    );

    assert!(project.add_member("bob", ProjectRole::Viewer, now).is_ok());
    let mut accepted = invitation.clone();
    assert!(accepted.accept(now).is_ok());
    accepted.invitee_subject = Some("bob".to_owned());

    let write = ProjectWrite {
        project: project.into_document(2),
        expected_revision: 1,
        invitation: Some(accepted),
        audit_events: vec![AuditEvent {
            project_id,
            subject: "invite-owner".to_owned(),
            action: AuditAction::RoleChanged,
            target_subject: Some("bob".to_owned()),
            old_role: None,
            new_role: Some(ProjectRole::Viewer),
            removed_role: None,
            detail: None,
        }],
    };
    let outcome = projects.commit_project_write(write.clone()).await;
    assert!(matches!(outcome, Ok(WriteOutcome::Committed)));

    let replay = projects
        .commit_project_write(ProjectWrite {
            expected_revision: 2,
            ..write
        })
        .await;
    assert!(matches!(replay, Ok(WriteOutcome::InvitationNotPending)));

    let entries = audit
        .list_recent_entries(project_id, AuditLogQuery::default())
        .await
        .unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].new_role, Some(ProjectRole::Viewer));
}
