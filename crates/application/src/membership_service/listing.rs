use super::*;

impl MembershipService {
    /// Resolves members of a project for any member caller.
    ///
    /// Requested ids that are not members are ignored; all members are
    /// returned when `member_ids` is `None`.
    pub async fn list_project_members(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        member_ids: Option<Vec<String>>,
    ) -> AppResult<Vec<ProjectMember>> {
        let project = self.load_project(project_id).await?;
        if !project.is_member(actor.subject()) {
            return Err(AppError::Forbidden(format!(
                "subject '{}' is not a member of project '{project_id}'",
                actor.subject()
            )));
        }

        let mut subjects: Vec<String> = project.members().to_vec();
        if !subjects.iter().any(|subject| subject == project.owner()) {
            subjects.insert(0, project.owner().to_owned());
        }
        if let Some(requested) = member_ids {
            subjects.retain(|subject| requested.iter().any(|value| value == subject));
        }

        let mut members = Vec::with_capacity(subjects.len());
        for subject in subjects {
            let profile = self.identity_provider.resolve_user_by_id(&subject).await?;
            let role = project.role_of(&subject);
            members.push(match profile {
                Some(profile) => ProjectMember {
                    subject,
                    email: profile.email,
                    display_name: profile.display_name,
                    role,
                },
                None => ProjectMember {
                    subject,
                    email: None,
                    display_name: UNKNOWN_MEMBER_DISPLAY_NAME.to_owned(),
                    role,
                },
            });
        }

        Ok(members)
    }
}
