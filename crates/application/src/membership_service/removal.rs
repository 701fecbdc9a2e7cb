use super::*;

impl MembershipService {
    /// Removes a member and records a `member_removed` audit entry.
    ///
    /// The actor must out-rank the member being removed. Members listed
    /// without a role rank below every role.
    pub async fn remove_member(
        &self,
        actor: &UserIdentity,
        project_id: &str,
        target_subject: &str,
    ) -> AppResult<String> {
        let project_id = ProjectId::from_str(project_id)?;
        let target_subject = parse_target(actor, target_subject)?;
        let now = Utc::now();

        commit_with_retry(
            self.project_repository.as_ref(),
            project_id,
            |document| {
                let mut project = Project::from_document(document)?;
                let actor_role =
                    ensure_permission(&project, actor.subject(), Permission::RemoveMembers)?;
                let current_role = member_target(&project, &target_subject)?;

                if let Some(current_role) = current_role
                    && current_role >= actor_role
                {
                    return Err(AppError::Forbidden(format!(
                        "role '{}' cannot remove a member with role '{}'",
                        actor_role.as_str(),
                        current_role.as_str()
                    )));
                }

                let removed_role = project.remove_member(&target_subject, now)?;
                let event = AuditEvent {
                    project_id,
                    subject: actor.subject().to_owned(),
                    action: AuditAction::MemberRemoved,
                    target_subject: Some(target_subject.clone()),
                    old_role: None,
                    new_role: None,
                    removed_role,
                    detail: Some(match current_role {
                        Some(role) => {
                            format!("removed '{target_subject}' with role '{}'", role.as_str())
                        }
                        None => format!("removed '{target_subject}' without a role"),
                    }),
                };

                Ok(StagedWrite::project(
                    project,
                    format!("Removed {target_subject} from the project"),
                )
                .with_audit_event(event))
            },
        )
        .await
    }
}
