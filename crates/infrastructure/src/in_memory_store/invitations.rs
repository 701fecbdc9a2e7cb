use super::*;

#[async_trait]
impl InvitationRepository for InMemoryStore {
    async fn create_pending_invitation(&self, invitation: Invitation) -> AppResult<()> {
        let mut state = self.state.write().await;
        let superseded_at = invitation.created_at;
        let mut pending_exists = false;
        for stored in state.invitations.values_mut().filter(|stored| {
            stored.status == InvitationStatus::Pending
                && stored.project_id == invitation.project_id
                && stored.invitee_email == invitation.invitee_email
        }) {
            if stored.is_expired(superseded_at) {
                stored.status = InvitationStatus::Declined;
                stored.declined_at = Some(superseded_at);
            } else {
                pending_exists = true;
            }
        }
        if pending_exists || state.invitations.contains_key(invitation.id.as_str()) {
            return Err(AppError::Conflict(format!(
                "a pending invitation for '{}' already exists in project '{}'",
                invitation.invitee_email.as_str(),
                invitation.project_id
            )));
        }

        state
            .invitations
            .insert(invitation.id.as_str().to_owned(), invitation);
        Ok(())
    }

    async fn find_invitation(
        &self,
        invitation_id: &InvitationId,
    ) -> AppResult<Option<Invitation>> {
        Ok(self
            .state
            .read()
            .await
            .invitations
            .get(invitation_id.as_str())
            .cloned())
    }

    async fn find_pending_invitation(
        &self,
        project_id: ProjectId,
        invitee_email: &EmailAddress,
    ) -> AppResult<Option<Invitation>> {
        Ok(self
            .state
            .read()
            .await
            .invitations
            .values()
            .find(|stored| {
                stored.status == InvitationStatus::Pending
                    && stored.project_id == project_id
                    && &stored.invitee_email == invitee_email
            })
            .cloned())
    }

    async fn list_pending_invitations_for_invitee(
        &self,
        invitee_email: Option<&EmailAddress>,
        invitee_subject: &str,
    ) -> AppResult<Vec<Invitation>> {
        let state = self.state.read().await;
        let mut invitations: Vec<Invitation> = state
            .invitations
            .values()
            .filter(|stored| {
                stored.status == InvitationStatus::Pending
                    && (invitee_email.is_some_and(|email| &stored.invitee_email == email)
                        || stored.invitee_subject.as_deref() == Some(invitee_subject))
            })
            .cloned()
            .collect();
        invitations.sort_by(|left, right| right.created_at.cmp(&left.created_at));

        Ok(invitations)
    }

    async fn record_decision(&self, invitation: &Invitation) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let Some(stored) = state.invitations.get_mut(invitation.id.as_str()) else {
            return Ok(false);
        };
        if stored.status != InvitationStatus::Pending {
            return Ok(false);
        }

        *stored = invitation.clone();
        Ok(true)
    }
}
