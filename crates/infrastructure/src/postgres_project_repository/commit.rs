use sqlx::{Postgres, Transaction};
use taskflow_domain::Invitation;

use super::*;

impl PostgresProjectRepository {
    pub(super) async fn commit_project_write_impl(
        &self,
        write: ProjectWrite,
    ) -> AppResult<WriteOutcome> {
        let project_id = write.project.id;
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let updated = sqlx::query(
            r#"
            UPDATE projects
            SET
                name = $3,
                description = $4,
                owner_subject = $5,
                members = $6,
                member_roles = $7,
                boards = $8,
                updated_at = $9,
                migrated_at = $10,
                revision = revision + 1
            WHERE id = $1 AND revision = $2
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(write.expected_revision)
        .bind(write.project.name.as_str())
        .bind(write.project.description.as_str())
        .bind(write.project.owner.as_deref())
        .bind(write.project.members.as_deref())
        .bind(write.project.member_roles.as_ref().map(Json))
        .bind(write.project.boards.as_slice())
        .bind(write.project.updated_at)
        .bind(write.project.migrated_at)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update project '{project_id}': {error}"))
        })?;

        if updated.rows_affected() == 0 {
            debug!(%project_id, expected_revision = write.expected_revision, "project revision conflict");
            return Ok(WriteOutcome::RevisionConflict);
        }

        if let Some(invitation) = write.invitation.as_ref()
            && !transition_invitation(&mut transaction, invitation).await?
        {
            return Ok(WriteOutcome::InvitationNotPending);
        }

        for event in &write.audit_events {
            append_audit_event(&mut transaction, event).await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(WriteOutcome::Committed)
    }
}

async fn transition_invitation(
    transaction: &mut Transaction<'_, Postgres>,
    invitation: &Invitation,
) -> AppResult<bool> {
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
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to update invitation '{}': {error}",
            invitation.id
        ))
    })?;

    Ok(updated.rows_affected() == 1)
}

/// Appends one audit event inside the caller's transaction.
pub(crate) async fn append_audit_event(
    transaction: &mut Transaction<'_, Postgres>,
    event: &AuditEvent,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_log_entries (
            project_id,
            subject,
            action,
            target_subject,
            old_role,
            new_role,
            removed_role,
            detail
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(event.project_id.as_uuid())
    .bind(event.subject.as_str())
    .bind(event.action.as_str())
    .bind(event.target_subject.as_deref())
    .bind(event.old_role.map(|role| role.as_str()))
    .bind(event.new_role.map(|role| role.as_str()))
    .bind(event.removed_role.map(|role| role.as_str()))
    .bind(event.detail.as_deref())
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

    Ok(())
}
