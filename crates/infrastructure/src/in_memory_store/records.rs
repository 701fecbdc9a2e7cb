use super::*;

#[async_trait]
impl AuditLogRepository for InMemoryStore {
    async fn list_recent_entries(
        &self,
        project_id: ProjectId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        let state = self.state.read().await;

        Ok(state
            .audit_events
            .iter()
            .rev()
            .filter(|stored| stored.event.project_id == project_id)
            .skip(query.offset)
            .take(query.limit)
            .map(|stored| AuditLogEntry {
                event_id: stored.event_id.to_string(),
                project_id: stored.event.project_id,
                subject: stored.event.subject.clone(),
                action: stored.event.action,
                target_subject: stored.event.target_subject.clone(),
                old_role: stored.event.old_role,
                new_role: stored.event.new_role,
                removed_role: stored.event.removed_role,
                detail: stored.event.detail.clone(),
                created_at: stored.created_at.to_rfc3339(),
            })
            .collect())
    }
}

#[async_trait]
impl MigrationLogRepository for InMemoryStore {
    async fn create_migration_log(&self, log: &MigrationLog) -> AppResult<()> {
        let mut state = self.state.write().await;
        if state.migration_logs.contains_key(&log.id) {
            return Err(AppError::Conflict(format!(
                "migration log '{}' already exists",
                log.id
            )));
        }

        state.migration_logs.insert(log.id, log.clone());
        Ok(())
    }

    async fn save_migration_log(&self, log: &MigrationLog) -> AppResult<()> {
        let mut state = self.state.write().await;
        let Some(stored) = state.migration_logs.get_mut(&log.id) else {
            return Err(AppError::Internal(format!(
                "migration log '{}' does not exist",
                log.id
            )));
        };

        *stored = log.clone();
        Ok(())
    }

    async fn find_migration_log(&self, migration_id: Uuid) -> AppResult<Option<MigrationLog>> {
        Ok(self
            .state
            .read()
            .await
            .migration_logs
            .get(&migration_id)
            .cloned())
    }

    async fn list_migration_logs_for_subject(
        &self,
        subject: &str,
        limit: usize,
    ) -> AppResult<Vec<MigrationLog>> {
        let state = self.state.read().await;
        let mut logs: Vec<MigrationLog> = state
            .migration_logs
            .values()
            .filter(|log| log.subject == subject)
            .cloned()
            .collect();
        logs.sort_by(|left, right| right.started_at.cmp(&left.started_at));
        logs.truncate(limit);

        Ok(logs)
    }
}

#[async_trait]
impl IdentityProvider for InMemoryStore {
    async fn resolve_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|profile| {
                profile
                    .email
                    .as_deref()
                    .is_some_and(|value| email.matches(value))
            })
            .map(|profile| profile.subject.clone()))
    }

    async fn resolve_user_by_id(&self, subject: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.state.read().await.users.get(subject).cloned())
    }

    async fn upsert_user(&self, profile: UserProfile) -> AppResult<()> {
        let mut state = self.state.write().await;
        if let Some(email) = profile.email.as_deref() {
            let email = EmailAddress::new(email)?;
            if state.users.values().any(|stored| {
                stored.subject != profile.subject
                    && stored
                        .email
                        .as_deref()
                        .is_some_and(|value| email.matches(value))
            }) {
                return Err(AppError::Conflict(format!(
                    "email for user '{}' is already registered to another user",
                    profile.subject
                )));
            }
        }

        state.users.insert(profile.subject.clone(), profile);
        Ok(())
    }
}
