use super::*;

impl InvitationService {
    /// Invites a user by email to join a project with a role.
    pub async fn invite_user(
        &self,
        actor: &UserIdentity,
        input: InviteUserInput,
    ) -> AppResult<InvitationReceipt> {
        if input.project_id.trim().is_empty() || input.email.trim().is_empty() {
            return Err(AppError::Validation(
                "project id and email are required".to_owned(),
            ));
        }

        let project_id = ProjectId::from_str(input.project_id.as_str())?;
        let invitee_email = EmailAddress::new(input.email)?;
        let role = ProjectRole::from_transport(input.role.as_str())?;
        if !role.is_assignable() {
            return Err(AppError::Validation(
                "invitations cannot grant the owner role".to_owned(),
            ));
        }

        let document = self
            .project_repository
            .find_project(project_id)
            .await?
            .ok_or_else(|| project_not_found(project_id))?;
        let project = Project::from_document(document)?;

        let actor_role = ensure_permission(&project, actor.subject(), Permission::InviteMembers)?;
        if role == ProjectRole::Admin && actor_role != ProjectRole::Owner {
            return Err(AppError::Forbidden(
                "only the project owner can invite admins".to_owned(),
            ));
        }

        if project.needs_migration() {
            return Err(AppError::FailedPrecondition(format!(
                "project '{project_id}' must be migrated before inviting members"
            )));
        }

        let invitee_subject = self
            .identity_provider
            .resolve_user_by_email(&invitee_email)
            .await?;
        if invitee_subject
            .as_deref()
            .is_some_and(|subject| project.is_member(subject))
        {
            return Err(AppError::Conflict(format!(
                "'{}' is already a member of this project",
                invitee_email.as_str()
            )));
        }

        let now = Utc::now();
        if self
            .invitation_repository
            .find_pending_invitation(project_id, &invitee_email)
            .await?
            .is_some_and(|pending| pending.is_open(now))
        {
            return Err(AppError::Conflict(format!(
                "a pending invitation for '{}' already exists",
                invitee_email.as_str()
            )));
        }

        let invitation = Invitation::issue(
            InvitationDraft {
                project_id,
                project_name: project.name().as_str().to_owned(),
                inviter_subject: actor.subject().to_owned(),
                inviter_email: actor.email().map(ToOwned::to_owned),
                invitee_email: invitee_email.clone(),
                invitee_subject,
                role,
            },
            now,
            self.invitation_ttl,
        )?;
        let invitation_id = invitation.id.clone();

        self.invitation_repository
            .create_pending_invitation(invitation)
            .await?;

        Ok(InvitationReceipt {
            invitation_id,
            message: format!("Invitation sent to {}", invitee_email.as_str()),
        })
    }
}
