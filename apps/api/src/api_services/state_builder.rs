use std::sync::Arc;

use sqlx::PgPool;
use taskflow_application::{
    AuthorizationService, InvitationService, MembershipService, MigrationService, ProjectService,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

mod repositories;

use repositories::RepositorySet;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    assemble_app_state(
        repositories::build_postgres_repository_set(&pool),
        config,
    )
}

/// Builds state over one shared in-memory store.
#[cfg(test)]
pub fn build_in_memory_app_state(
    store: Arc<taskflow_infrastructure::InMemoryStore>,
    config: &ApiConfig,
) -> AppState {
    assemble_app_state(repositories::build_in_memory_repository_set(store), config)
}

fn assemble_app_state(repositories: RepositorySet, config: &ApiConfig) -> AppState {
    AppState {
        project_service: ProjectService::new(repositories.project_repository.clone()),
        authorization_service: AuthorizationService::new(
            repositories.project_repository.clone(),
        ),
        invitation_service: InvitationService::new(
            repositories.project_repository.clone(),
            repositories.invitation_repository,
            repositories.identity_provider.clone(),
        )
        .with_invitation_ttl(config.invitation_ttl),
        membership_service: MembershipService::new(
            repositories.project_repository.clone(),
            repositories.audit_log_repository,
            repositories.identity_provider.clone(),
        )
        .with_grant_policy(config.role_grant_policy),
        migration_service: MigrationService::new(
            repositories.project_repository,
            repositories.migration_log_repository,
            repositories.identity_provider.clone(),
        ),
        identity_provider: repositories.identity_provider,
        bootstrap_token: Arc::from(config.bootstrap_token.as_str()),
    }
}
