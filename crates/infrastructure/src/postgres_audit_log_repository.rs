use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use taskflow_application::{AuditLogEntry, AuditLogQuery, AuditLogRepository};
use taskflow_core::{AppError, AppResult, ProjectId};
use taskflow_domain::{AuditAction, ProjectRole};

/// PostgreSQL-backed repository for audit log read models.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    event_id: uuid::Uuid,
    project_id: uuid::Uuid,
    subject: String,
    action: String,
    target_subject: Option<String>,
    old_role: Option<String>,
    new_role: Option<String>,
    removed_role: Option<String>,
    detail: Option<String>,
    created_at: String,
}

fn parse_role(value: Option<String>) -> AppResult<Option<ProjectRole>> {
    value
        .as_deref()
        .map(ProjectRole::from_str)
        .transpose()
}

impl TryFrom<AuditLogRow> for AuditLogEntry {
    type Error = AppError;

    fn try_from(row: AuditLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            event_id: row.event_id.to_string(),
            project_id: ProjectId::from_uuid(row.project_id),
            subject: row.subject,
            action: AuditAction::from_str(row.action.as_str())?,
            target_subject: row.target_subject,
            old_role: parse_role(row.old_role)?,
            new_role: parse_role(row.new_role)?,
            removed_role: parse_role(row.removed_role)?,
            detail: row.detail,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent_entries(
        &self,
        project_id: ProjectId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, 200) as i64;
        let capped_offset = query.offset.min(5_000) as i64;
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id AS event_id,
                project_id,
                subject,
                action,
                target_subject,
                old_role,
                new_role,
                removed_role,
                detail,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM audit_log_entries
            WHERE project_id = $1
            ORDER BY audit_log_entries.created_at DESC, id
            LIMIT $2
            OFFSET $3
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list audit log entries: {error}"))
        })?;

        rows.into_iter().map(AuditLogEntry::try_from).collect()
    }
}
