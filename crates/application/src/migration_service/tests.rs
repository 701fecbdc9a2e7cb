use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use taskflow_core::{AppError, ProjectId};
use taskflow_domain::{AuditAction, MigrationLog, MigrationStatus, ProjectRole};
use uuid::Uuid;

use crate::test_support::{FakeStore, identity, roles};

use super::{MigrateProjectsInput, MigrationReport, MigrationService};

fn service(store: &Arc<FakeStore>) -> MigrationService {
    MigrationService::new(store.clone(), store.clone(), store.clone())
}

async fn seeded_store() -> Arc<FakeStore> {
    let store = Arc::new(FakeStore::default());
    store.add_user("u1", "u1@x.com").await;
    store.add_user("u2", "u2@x.com").await;
    store.add_user("u3", "u3@x.com").await;
    store
}

fn live(role_overrides: BTreeMap<ProjectId, BTreeMap<String, ProjectRole>>) -> MigrateProjectsInput {
    MigrateProjectsInput {
        dry_run: false,
        role_overrides,
    }
}

#[tokio::test]
async fn dry_run_reports_partition_without_writing() {
    let store = seeded_store().await;
    let legacy = store
        .insert_legacy_project(Some("u1"), Some(vec!["u2", "u2", "ghost"]))
        .await;
    store.insert_legacy_project(None, Some(vec!["u1"])).await;
    store.insert_project("u1", &[]).await;

    let report = service(&store)
        .migrate_my_projects(
            &identity("u1", "u1@x.com"),
            MigrateProjectsInput {
                dry_run: true,
                role_overrides: BTreeMap::new(),
            },
        )
        .await;

    let Ok(MigrationReport::DryRun { validation, plan }) = report else {
        unreachable!()
    };
    assert_eq!(validation.valid_projects.len(), 1);
    assert_eq!(validation.invalid_projects.len(), 1);
    assert_eq!(
        validation.invalid_projects[0].errors,
        vec!["Missing owner field".to_owned()]
    );
    assert_eq!(validation.already_migrated.len(), 1);
    assert_eq!(validation.warnings.len(), 3);
    assert_eq!(plan.projects_to_migrate, 1);
    assert_eq!(plan.estimated_duration_seconds, 2);
    assert_eq!(plan.projects_that_would_fail, 1);

    assert_eq!(store.document(legacy).await.revision, 1);
    assert!(store.migration_logs.lock().await.is_empty());
}

#[tokio::test]
async fn live_run_installs_roles_with_overrides_and_verifies() {
    let store = seeded_store().await;
    let project_id = store
        .insert_legacy_project(Some("u1"), Some(vec!["u2", "u3", "ghost"]))
        .await;
    let overrides = BTreeMap::from([(
        project_id,
        roles(&[
            ("u2", ProjectRole::Viewer),
            ("u1", ProjectRole::Viewer),
            ("ghost", ProjectRole::Admin),
        ]),
    )]);

    let report = service(&store)
        .migrate_my_projects(&identity("u1", "u1@x.com"), live(overrides))
        .await;
    let Ok(MigrationReport::Run(report)) = report else {
        unreachable!()
    };

    assert_eq!(report.status, MigrationStatus::Completed);
    assert_eq!(report.successful, vec![project_id]);
    assert_eq!(report.verified, vec![project_id]);
    assert!(report.inconsistencies.is_empty());
    assert_eq!(report.warnings.len(), 2);

    let document = store.document(project_id).await;
    assert_eq!(
        document.members,
        Some(vec!["u1".to_owned(), "u2".to_owned(), "u3".to_owned()])
    );
    assert_eq!(
        document.member_roles,
        Some(roles(&[
            ("u2", ProjectRole::Viewer),
            ("u3", ProjectRole::Editor),
        ]))
    );
    assert!(document.migrated_at.is_some());

    let events = store.audit_events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::RbacMigration);

    let logs = store.migration_logs.lock().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].status, MigrationStatus::Completed);
    assert!(logs[0].completed_at.is_some());
    assert_eq!(logs[0].results.as_ref().map(|results| results.verified), Some(1));
}

#[tokio::test]
async fn rerun_skips_migrated_projects() {
    let store = seeded_store().await;
    let project_id = store
        .insert_legacy_project(Some("u1"), Some(vec!["u1", "u2"]))
        .await;
    let owner = identity("u1", "u1@x.com");
    let service = service(&store);

    assert!(
        service
            .migrate_my_projects(&owner, live(BTreeMap::new()))
            .await
            .is_ok()
    );
    let after_first = store.document(project_id).await;

    let second = service
        .migrate_my_projects(&owner, live(BTreeMap::new()))
        .await;
    let Ok(MigrationReport::Run(second)) = second else {
        unreachable!()
    };
    assert!(second.successful.is_empty());
    assert_eq!(second.validation.already_migrated.len(), 1);
    assert_eq!(store.document(project_id).await, after_first);
}

#[tokio::test]
async fn failing_project_does_not_stop_the_batch() {
    let store = seeded_store().await;
    let broken = store
        .insert_legacy_project(Some("u1"), Some(vec!["u1", "u2"]))
        .await;
    let healthy = store
        .insert_legacy_project(Some("u1"), Some(vec!["u1", "u3"]))
        .await;
    store.failing_commits.lock().await.push(broken);

    let report = service(&store)
        .migrate_my_projects(&identity("u1", "u1@x.com"), live(BTreeMap::new()))
        .await;
    let Ok(MigrationReport::Run(report)) = report else {
        unreachable!()
    };

    assert_eq!(report.status, MigrationStatus::CompletedWithErrors);
    assert_eq!(report.successful, vec![healthy]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].project_id, broken);
    assert!(store.document(broken).await.member_roles.is_none());
    assert!(store.document(healthy).await.member_roles.is_some());
}

#[tokio::test]
async fn concurrent_run_for_same_user_is_rejected() {
    let store = seeded_store().await;
    store
        .insert_legacy_project(Some("u1"), Some(vec!["u1"]))
        .await;
    store
        .migration_logs
        .lock()
        .await
        .push(MigrationLog::start("u1", None, &[], Utc::now()));

    let result = service(&store)
        .migrate_my_projects(&identity("u1", "u1@x.com"), live(BTreeMap::new()))
        .await;
    assert!(matches!(result, Err(AppError::FailedPrecondition(_))));
}

#[tokio::test]
async fn migration_status_is_scoped_to_the_caller() {
    let store = seeded_store().await;
    store
        .insert_legacy_project(Some("u1"), Some(vec!["u1", "u2"]))
        .await;
    let owner = identity("u1", "u1@x.com");
    let service = service(&store);

    let report = service
        .migrate_my_projects(&owner, live(BTreeMap::new()))
        .await;
    let Ok(MigrationReport::Run(report)) = report else {
        unreachable!()
    };

    let own = service.get_migration_log(&owner, report.migration_id).await;
    assert!(matches!(own, Ok(log) if log.status == MigrationStatus::Completed));

    let other = service
        .get_migration_log(&identity("u2", "u2@x.com"), report.migration_id)
        .await;
    assert!(matches!(other, Err(AppError::NotFound(_))));

    let missing = service.get_migration_log(&owner, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let logs = service.list_my_migration_logs(&owner).await.unwrap_or_default();
    assert_eq!(logs.len(), 1);
}

#[tokio::test]
async fn check_migration_needed_counts_owned_legacy_projects() {
    let store = seeded_store().await;
    store
        .insert_legacy_project(Some("u1"), Some(vec!["u1"]))
        .await;
    store.insert_project("u1", &[]).await;
    store
        .insert_legacy_project(Some("u2"), Some(vec!["u2", "u1"]))
        .await;

    let need = service(&store)
        .check_migration_needed(&identity("u1", "u1@x.com"))
        .await;
    assert!(matches!(
        need,
        Ok(need) if need.needs_migration && need.total_projects == 2 && need.projects_to_migrate == 1
    ));
}
