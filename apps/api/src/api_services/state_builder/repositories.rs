use std::sync::Arc;

use sqlx::PgPool;
use taskflow_application::{
    AuditLogRepository, IdentityProvider, InvitationRepository, MigrationLogRepository,
    ProjectRepository,
};
use taskflow_infrastructure::{
    PostgresAuditLogRepository, PostgresInvitationRepository, PostgresMigrationLogRepository,
    PostgresProjectRepository, PostgresUserDirectory,
};

pub(super) struct RepositorySet {
    pub(super) project_repository: Arc<dyn ProjectRepository>,
    pub(super) invitation_repository: Arc<dyn InvitationRepository>,
    pub(super) audit_log_repository: Arc<dyn AuditLogRepository>,
    pub(super) migration_log_repository: Arc<dyn MigrationLogRepository>,
    pub(super) identity_provider: Arc<dyn IdentityProvider>,
}

pub(super) fn build_postgres_repository_set(pool: &PgPool) -> RepositorySet {
    RepositorySet {
        project_repository: Arc::new(PostgresProjectRepository::new(pool.clone())),
        invitation_repository: Arc::new(PostgresInvitationRepository::new(pool.clone())),
        audit_log_repository: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        migration_log_repository: Arc::new(PostgresMigrationLogRepository::new(pool.clone())),
        identity_provider: Arc::new(PostgresUserDirectory::new(pool.clone())),
    }
}

#[cfg(test)]
pub(super) fn build_in_memory_repository_set(
    store: Arc<taskflow_infrastructure::InMemoryStore>,
) -> RepositorySet {
    RepositorySet {
        project_repository: store.clone(),
        invitation_repository: store.clone(),
        audit_log_repository: store.clone(),
        migration_log_repository: store.clone(),
        identity_provider: store,
    }
}
