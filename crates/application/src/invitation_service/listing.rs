use super::*;

impl InvitationService {
    /// Lists open invitations addressed to the actor, newest first.
    pub async fn list_my_invitations(&self, actor: &UserIdentity) -> AppResult<Vec<Invitation>> {
        let email = actor
            .email()
            .and_then(|value| EmailAddress::new(value).ok());

        let now = Utc::now();
        let mut invitations: Vec<Invitation> = self
            .invitation_repository
            .list_pending_invitations_for_invitee(email.as_ref(), actor.subject())
            .await?
            .into_iter()
            .filter(|invitation| {
                invitation.is_open(now) && invitation.is_addressed_to(actor.subject(), actor.email())
            })
            .collect();

        invitations.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(invitations)
    }
}
