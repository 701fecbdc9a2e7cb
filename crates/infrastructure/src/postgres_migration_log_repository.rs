use std::collections::BTreeMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use taskflow_application::MigrationLogRepository;
use taskflow_core::{AppError, AppResult};
use taskflow_domain::{MigrationLog, MigrationResults, MigrationStatus, ProjectProgress};

/// PostgreSQL-backed repository for migration run logs.
#[derive(Clone)]
pub struct PostgresMigrationLogRepository {
    pool: PgPool,
}

impl PostgresMigrationLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MigrationLogRow {
    id: Uuid,
    subject: String,
    email: Option<String>,
    status: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    total_projects: i32,
    progress: Json<BTreeMap<String, ProjectProgress>>,
    results: Option<Json<MigrationResults>>,
}

impl TryFrom<MigrationLogRow> for MigrationLog {
    type Error = AppError;

    fn try_from(row: MigrationLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            subject: row.subject,
            email: row.email,
            status: MigrationStatus::from_str(row.status.as_str())?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            total_projects: usize::try_from(row.total_projects).map_err(|error| {
                AppError::Internal(format!("invalid total_projects in migration log: {error}"))
            })?,
            progress: row.progress.0,
            results: row.results.map(|results| results.0),
        })
    }
}

fn total_projects(log: &MigrationLog) -> AppResult<i32> {
    i32::try_from(log.total_projects).map_err(|error| {
        AppError::Internal(format!("migration log project count out of range: {error}"))
    })
}

#[async_trait]
impl MigrationLogRepository for PostgresMigrationLogRepository {
    async fn create_migration_log(&self, log: &MigrationLog) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO migration_logs (
                id,
                subject,
                email,
                status,
                started_at,
                completed_at,
                total_projects,
                progress,
                results
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(log.id)
        .bind(log.subject.as_str())
        .bind(log.email.as_deref())
        .bind(log.status.as_str())
        .bind(log.started_at)
        .bind(log.completed_at)
        .bind(total_projects(log)?)
        .bind(Json(&log.progress))
        .bind(log.results.as_ref().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create migration log: {error}")))?;

        Ok(())
    }

    async fn save_migration_log(&self, log: &MigrationLog) -> AppResult<()> {
        let updated = sqlx::query(
            r#"
            UPDATE migration_logs
            SET
                status = $2,
                completed_at = $3,
                progress = $4,
                results = $5
            WHERE id = $1
            "#,
        )
        .bind(log.id)
        .bind(log.status.as_str())
        .bind(log.completed_at)
        .bind(Json(&log.progress))
        .bind(log.results.as_ref().map(Json))
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to save migration log '{}': {error}", log.id))
        })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "migration log '{}' does not exist",
                log.id
            )));
        }

        Ok(())
    }

    async fn find_migration_log(&self, migration_id: Uuid) -> AppResult<Option<MigrationLog>> {
        let row = sqlx::query_as::<_, MigrationLogRow>(
            r#"
            SELECT
                id,
                subject,
                email,
                status,
                started_at,
                completed_at,
                total_projects,
                progress,
                results
            FROM migration_logs
            WHERE id = $1
            "#,
        )
        .bind(migration_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find migration log '{migration_id}': {error}"
            ))
        })?;

        row.map(MigrationLog::try_from).transpose()
    }

    async fn list_migration_logs_for_subject(
        &self,
        subject: &str,
        limit: usize,
    ) -> AppResult<Vec<MigrationLog>> {
        let rows = sqlx::query_as::<_, MigrationLogRow>(
            r#"
            SELECT
                id,
                subject,
                email,
                status,
                started_at,
                completed_at,
                total_projects,
                progress,
                results
            FROM migration_logs
            WHERE subject = $1
            ORDER BY started_at DESC
            LIMIT $2
            "#,
        )
        .bind(subject)
        .bind(limit.min(200) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list migration logs: {error}"))
        })?;

        rows.into_iter().map(MigrationLog::try_from).collect()
    }
}
