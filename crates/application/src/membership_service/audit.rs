use super::*;

impl MembershipService {
    /// Lists a project's audit entries, newest first.
    pub async fn list_project_audit_log(
        &self,
        actor: &UserIdentity,
        project_id: ProjectId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let project = self.load_project(project_id).await?;
        ensure_permission(&project, actor.subject(), Permission::RemoveMembers)?;

        self.audit_log_repository
            .list_recent_entries(project_id, query)
            .await
    }
}
