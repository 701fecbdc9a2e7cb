use super::*;

impl InvitationService {
    /// Accepts an invitation and joins the project in one write.
    ///
    /// Returns the joined project id.
    pub async fn accept_invitation(
        &self,
        actor: &UserIdentity,
        invitation_id: &str,
    ) -> AppResult<ProjectId> {
        let invitation = self.load_invitation(invitation_id).await?;
        let now = Utc::now();
        invitation.ensure_can_respond(actor.subject(), actor.email(), now)?;

        let project_id = invitation.project_id;
        let subject = actor.subject();

        commit_with_retry(
            self.project_repository.as_ref(),
            project_id,
            |document| {
                let mut project = Project::from_document(document)?;
                if project.is_member(subject) {
                    return Err(AppError::Conflict(format!(
                        "'{subject}' is already a member of project '{project_id}'"
                    )));
                }
                if project.needs_migration() {
                    return Err(AppError::FailedPrecondition(format!(
                        "project '{project_id}' must be migrated before members can join"
                    )));
                }

                project.add_member(subject, invitation.role, now)?;

                let mut accepted = invitation.clone();
                accepted.accept(now)?;
                accepted.invitee_subject = Some(subject.to_owned());

                Ok(StagedWrite::project(project, project_id).with_invitation(accepted))
            },
        )
        .await
    }

    /// Declines an invitation of a project that still exists.
    pub async fn decline_invitation(
        &self,
        actor: &UserIdentity,
        invitation_id: &str,
    ) -> AppResult<()> {
        let mut invitation = self.load_invitation(invitation_id).await?;
        let now = Utc::now();
        invitation.ensure_can_respond(actor.subject(), actor.email(), now)?;

        let project_id = invitation.project_id;
        if self
            .project_repository
            .find_project(project_id)
            .await?
            .is_none()
        {
            return Err(project_not_found(project_id));
        }

        invitation.decline(now)?;
        invitation.invitee_subject = Some(actor.subject().to_owned());

        if !self.invitation_repository.record_decision(&invitation).await? {
            return Err(AppError::Validation(format!(
                "invitation '{}' has already been answered",
                invitation.id
            )));
        }

        Ok(())
    }
}
