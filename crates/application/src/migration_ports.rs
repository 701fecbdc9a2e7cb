use async_trait::async_trait;
use uuid::Uuid;

use taskflow_core::AppResult;
use taskflow_domain::MigrationLog;

/// Number of logs returned when a caller lists their migration history.
pub const RECENT_MIGRATION_LOG_LIMIT: usize = 20;

/// Repository port for migration run logs.
#[async_trait]
pub trait MigrationLogRepository: Send + Sync {
    /// Persists a newly started run.
    async fn create_migration_log(&self, log: &MigrationLog) -> AppResult<()>;

    /// Overwrites progress, status and results of an existing run.
    async fn save_migration_log(&self, log: &MigrationLog) -> AppResult<()>;

    /// Finds a run by id.
    async fn find_migration_log(&self, migration_id: Uuid) -> AppResult<Option<MigrationLog>>;

    /// Lists a user's runs, newest first.
    async fn list_migration_logs_for_subject(
        &self,
        subject: &str,
        limit: usize,
    ) -> AppResult<Vec<MigrationLog>>;
}
