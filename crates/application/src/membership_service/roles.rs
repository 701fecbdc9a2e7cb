use super::*;

impl MembershipService {
    /// Changes a member's role and records a `role_changed` audit entry.
    ///
    /// Requesting the member's current role succeeds without writing.
    pub async fn change_member_role(
        &self,
        actor: &UserIdentity,
        project_id: &str,
        target_subject: &str,
        new_role: &str,
    ) -> AppResult<RoleChange> {
        let project_id = ProjectId::from_str(project_id)?;
        let target_subject = parse_target(actor, target_subject)?;
        let new_role = ProjectRole::from_transport(new_role)?;
        if !new_role.is_assignable() {
            return Err(AppError::Validation(
                "the owner role cannot be granted".to_owned(),
            ));
        }

        let grant_policy = self.grant_policy;
        let now = Utc::now();

        commit_with_retry(
            self.project_repository.as_ref(),
            project_id,
            |document| {
                let mut project = Project::from_document(document)?;
                let actor_role =
                    ensure_permission(&project, actor.subject(), Permission::RemoveMembers)?;
                let current_role = target_role(&project, &target_subject)?;

                if !can_modify_role(actor_role, current_role, new_role, grant_policy) {
                    return Err(AppError::Forbidden(format!(
                        "role '{}' cannot change '{}' to '{}'",
                        actor_role.as_str(),
                        current_role.as_str(),
                        new_role.as_str()
                    )));
                }

                if current_role == new_role {
                    return Ok(StagedWrite::unchanged(RoleChange {
                        previous_role: current_role,
                        new_role,
                        message: format!(
                            "{target_subject} already has role {}",
                            new_role.as_str()
                        ),
                    }));
                }

                let previous_role = project.set_member_role(&target_subject, new_role, now)?;
                let event = AuditEvent {
                    project_id,
                    subject: actor.subject().to_owned(),
                    action: AuditAction::RoleChanged,
                    target_subject: Some(target_subject.clone()),
                    old_role: Some(previous_role),
                    new_role: Some(new_role),
                    removed_role: None,
                    detail: Some(format!(
                        "changed role of '{target_subject}' from '{}' to '{}'",
                        previous_role.as_str(),
                        new_role.as_str()
                    )),
                };

                Ok(StagedWrite::project(
                    project,
                    RoleChange {
                        previous_role,
                        new_role,
                        message: format!(
                            "Changed {target_subject} from {} to {}",
                            previous_role.as_str(),
                            new_role.as_str()
                        ),
                    },
                )
                .with_audit_event(event))
            },
        )
        .await
    }
}
