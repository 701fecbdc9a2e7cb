use async_trait::async_trait;

use taskflow_core::{AppResult, ProjectId};
use taskflow_domain::{EmailAddress, Invitation, InvitationId};

/// Repository port for invitations.
#[async_trait]
pub trait InvitationRepository: Send + Sync {
    /// Stores a new pending invitation.
    ///
    /// A pending invitation for the same project and email that expired
    /// before `invitation.created_at` is moved to `declined` in the same
    /// operation. Fails with `Conflict` when the id is taken or an unexpired
    /// pending invitation already exists for the same project and email.
    async fn create_pending_invitation(&self, invitation: Invitation) -> AppResult<()>;

    /// Finds an invitation by id.
    async fn find_invitation(&self, invitation_id: &InvitationId)
    -> AppResult<Option<Invitation>>;

    /// Finds the pending invitation for a project and email, expired or not.
    async fn find_pending_invitation(
        &self,
        project_id: ProjectId,
        invitee_email: &EmailAddress,
    ) -> AppResult<Option<Invitation>>;

    /// Lists pending invitations addressed to an email or resolved user id.
    async fn list_pending_invitations_for_invitee(
        &self,
        invitee_email: Option<&EmailAddress>,
        invitee_subject: &str,
    ) -> AppResult<Vec<Invitation>>;

    /// Persists a decline transition if the stored invitation is still pending.
    ///
    /// Returns `false` when another transition won.
    async fn record_decision(&self, invitation: &Invitation) -> AppResult<bool>;
}
