use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use taskflow_application::InvitationRepository;
use taskflow_core::{AppError, AppResult, ProjectId};
use taskflow_domain::{
    EmailAddress, Invitation, InvitationId, InvitationStatus, ProjectRole,
};

/// PostgreSQL-backed repository for project invitations.
#[derive(Clone)]
pub struct PostgresInvitationRepository {
    pool: PgPool,
}

impl PostgresInvitationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InvitationRow {
    id: String,
    project_id: Uuid,
    project_name: String,
    inviter_subject: String,
    inviter_email: Option<String>,
    invitee_email: String,
    invitee_subject: Option<String>,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    declined_at: Option<DateTime<Utc>>,
}

impl TryFrom<InvitationRow> for Invitation {
    type Error = AppError;

    fn try_from(row: InvitationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: InvitationId::from_str(row.id.as_str())?,
            project_id: ProjectId::from_uuid(row.project_id),
            project_name: row.project_name,
            inviter_subject: row.inviter_subject,
            inviter_email: row.inviter_email,
            invitee_email: EmailAddress::new(row.invitee_email)?,
            invitee_subject: row.invitee_subject,
            role: ProjectRole::from_str(row.role.as_str())?,
            status: InvitationStatus::from_str(row.status.as_str())?,
            created_at: row.created_at,
            expires_at: row.expires_at,
            accepted_at: row.accepted_at,
            declined_at: row.declined_at,
        })
    }
}

fn map_rows(rows: Vec<InvitationRow>) -> AppResult<Vec<Invitation>> {
    rows.into_iter().map(Invitation::try_from).collect()
}

#[async_trait]
impl InvitationRepository for PostgresInvitationRepository {
    async fn create_pending_invitation(&self, invitation: Invitation) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            UPDATE project_invitations
            SET status = 'declined', declined_at = $3
            WHERE project_id = $1
                AND invitee_email = $2
                AND status = 'pending'
                AND expires_at < $3
            "#,
        )
        .bind(invitation.project_id.as_uuid())
        .bind(invitation.invitee_email.as_str())
        .bind(invitation.created_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to supersede expired invitation: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO project_invitations (
                id,
                project_id,
                project_name,
                inviter_subject,
                inviter_email,
                invitee_email,
                invitee_subject,
                role,
                status,
                created_at,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9, $10)
            "#,
        )
        .bind(invitation.id.as_str())
        .bind(invitation.project_id.as_uuid())
        .bind(invitation.project_name.as_str())
        .bind(invitation.inviter_subject.as_str())
        .bind(invitation.inviter_email.as_deref())
        .bind(invitation.invitee_email.as_str())
        .bind(invitation.invitee_subject.as_deref())
        .bind(invitation.role.as_str())
        .bind(invitation.created_at)
        .bind(invitation.expires_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!(
                    "a pending invitation for '{}' already exists",
                    invitation.invitee_email.as_str()
                ));
            }

            AppError::Internal(format!("failed to create invitation: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit invitation: {error}"))
        })?;

        Ok(())
    }

    async fn find_invitation(
        &self,
        invitation_id: &InvitationId,
    ) -> AppResult<Option<Invitation>> {
        let row = sqlx::query_as::<_, InvitationRow>(
            r#"
            SELECT
                id,
                project_id,
                project_name,
                inviter_subject,
                inviter_email,
                invitee_email,
                invitee_subject,
                role,
                status,
                created_at,
                expires_at,
                accepted_at,
                declined_at
            FROM project_invitations
            WHERE id = $1
            "#,
        )
        .bind(invitation_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to find invitation '{invitation_id}': {error}"
            ))
        })?;

        row.map(Invitation::try_from).transpose()
    }

    async fn find_pending_invitation(
        &self,
        project_id: ProjectId,
        invitee_email: &EmailAddress,
    ) -> AppResult<Option<Invitation>> {
        let row = sqlx::query_as::<_, InvitationRow>(
            r#"
            SELECT
                id,
                project_id,
                project_name,
                inviter_subject,
                inviter_email,
                invitee_email,
                invitee_subject,
                role,
                status,
                created_at,
                expires_at,
                accepted_at,
                declined_at
            FROM project_invitations
            WHERE project_id = $1 AND invitee_email = $2 AND status = 'pending'
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(invitee_email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find pending invitation: {error}"))
        })?;

        row.map(Invitation::try_from).transpose()
    }

    async fn list_pending_invitations_for_invitee(
        &self,
        invitee_email: Option<&EmailAddress>,
        invitee_subject: &str,
    ) -> AppResult<Vec<Invitation>> {
        let rows = sqlx::query_as::<_, InvitationRow>(
            r#"
            SELECT
                id,
                project_id,
                project_name,
                inviter_subject,
                inviter_email,
                invitee_email,
                invitee_subject,
                role,
                status,
                created_at,
                expires_at,
                accepted_at,
                declined_at
            FROM project_invitations
            WHERE status = 'pending'
                AND (invitee_email = $1 OR invitee_subject = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(invitee_email.map(EmailAddress::as_str))
        .bind(invitee_subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list pending invitations: {error}"))
        })?;

        map_rows(rows)
    }

    async fn record_decision(&self, invitation: &Invitation) -> AppResult<bool> {
        let updated = sqlx::query(
            r#"
            UPDATE project_invitations
            SET
                status = $2,
                invitee_subject = $3,
                accepted_at = $4,
                declined_at = $5
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(invitation.id.as_str())
        .bind(invitation.status.as_str())
        .bind(invitation.invitee_subject.as_deref())
        .bind(invitation.accepted_at)
        .bind(invitation.declined_at)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record decision for invitation '{}': {error}",
                invitation.id
            ))
        })?;

        Ok(updated.rows_affected() == 1)
    }
}
