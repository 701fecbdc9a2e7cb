use super::*;

impl MigrationService {
    /// Returns one of the caller's migration logs.
    pub async fn get_migration_log(
        &self,
        actor: &UserIdentity,
        migration_id: Uuid,
    ) -> AppResult<MigrationLog> {
        self.migration_log_repository
            .find_migration_log(migration_id)
            .await?
            .filter(|log| log.subject == actor.subject())
            .ok_or_else(|| AppError::NotFound(format!("migration '{migration_id}' does not exist")))
    }

    /// Lists the caller's most recent migration logs.
    pub async fn list_my_migration_logs(&self, actor: &UserIdentity) -> AppResult<Vec<MigrationLog>> {
        self.migration_log_repository
            .list_migration_logs_for_subject(actor.subject(), RECENT_MIGRATION_LOG_LIMIT)
            .await
    }

    /// Reports whether the caller owns projects that still lack roles.
    pub async fn check_migration_needed(&self, actor: &UserIdentity) -> AppResult<MigrationNeed> {
        let documents = self
            .project_repository
            .list_projects_owned_by(actor.subject())
            .await?;
        let projects_to_migrate = documents
            .iter()
            .filter(|document| document.member_roles.is_none())
            .count();

        Ok(MigrationNeed {
            needs_migration: projects_to_migrate > 0,
            total_projects: documents.len(),
            projects_to_migrate,
        })
    }
}
