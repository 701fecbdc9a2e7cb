use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::debug;
use uuid::Uuid;

use taskflow_application::{AuditEvent, ProjectRepository, ProjectWrite, WriteOutcome};
use taskflow_core::{AppError, AppResult, ProjectId};
use taskflow_domain::{ProjectDocument, ProjectRole};

mod commit;

/// PostgreSQL-backed repository for project documents.
#[derive(Clone)]
pub struct PostgresProjectRepository {
    pool: PgPool,
}

impl PostgresProjectRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    description: String,
    owner_subject: Option<String>,
    members: Option<Vec<String>>,
    member_roles: Option<Json<BTreeMap<String, ProjectRole>>>,
    boards: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    migrated_at: Option<DateTime<Utc>>,
    revision: i64,
}

impl From<ProjectRow> for ProjectDocument {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            owner: row.owner_subject,
            members: row.members,
            member_roles: row.member_roles.map(|roles| roles.0),
            boards: row.boards,
            created_at: row.created_at,
            updated_at: row.updated_at,
            migrated_at: row.migrated_at,
            revision: row.revision,
        }
    }
}

const PROJECT_COLUMNS: &str = r#"
    id,
    name,
    description,
    owner_subject,
    members,
    member_roles,
    boards,
    created_at,
    updated_at,
    migrated_at,
    revision
"#;

#[async_trait]
impl ProjectRepository for PostgresProjectRepository {
    async fn create_project(&self, project: ProjectDocument) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (
                id,
                name,
                description,
                owner_subject,
                members,
                member_roles,
                boards,
                created_at,
                updated_at,
                migrated_at,
                revision
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(project.id.as_uuid())
        .bind(project.name.as_str())
        .bind(project.description.as_str())
        .bind(project.owner.as_deref())
        .bind(project.members.as_deref())
        .bind(project.member_roles.as_ref().map(Json))
        .bind(project.boards.as_slice())
        .bind(project.created_at)
        .bind(project.updated_at)
        .bind(project.migrated_at)
        .bind(project.revision)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!("project '{}' already exists", project.id));
            }

            AppError::Internal(format!("failed to create project: {error}"))
        })?;

        Ok(())
    }

    async fn find_project(&self, project_id: ProjectId) -> AppResult<Option<ProjectDocument>> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(project_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find project '{project_id}': {error}"))
        })?;

        Ok(row.map(ProjectDocument::from))
    }

    async fn list_projects_for_member(&self, subject: &str) -> AppResult<Vec<ProjectDocument>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE owner_subject = $1 OR $1 = ANY(members)
            ORDER BY updated_at DESC
            "#
        ))
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list projects for '{subject}': {error}"))
        })?;

        Ok(rows.into_iter().map(ProjectDocument::from).collect())
    }

    async fn list_projects_owned_by(&self, subject: &str) -> AppResult<Vec<ProjectDocument>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE owner_subject = $1
                OR (owner_subject IS NULL AND $1 = ANY(members))
            ORDER BY created_at
            "#
        ))
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list projects owned by '{subject}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(ProjectDocument::from).collect())
    }

    async fn commit_project_write(&self, write: ProjectWrite) -> AppResult<WriteOutcome> {
        self.commit_project_write_impl(write).await
    }
}

#[cfg(test)]
mod tests;
