use super::*;

impl MigrationService {
    pub(super) async fn ensure_no_running_migration(&self, actor: &UserIdentity) -> AppResult<()> {
        let now = Utc::now();
        let running = self
            .migration_log_repository
            .list_migration_logs_for_subject(actor.subject(), RECENT_MIGRATION_LOG_LIMIT)
            .await?
            .into_iter()
            .find(|log| log.blocks_new_run(now));

        match running {
            Some(log) => Err(AppError::FailedPrecondition(format!(
                "migration '{}' is still in progress",
                log.id
            ))),
            None => Ok(()),
        }
    }

    /// Migrates every valid project in order, isolating per-project failures.
    pub(super) async fn run_migration(
        &self,
        actor: &UserIdentity,
        validation: ValidationReport,
        mut role_overrides: BTreeMap<ProjectId, BTreeMap<String, ProjectRole>>,
    ) -> AppResult<MigrationRunReport> {
        let project_ids: Vec<ProjectId> = validation
            .valid_projects
            .iter()
            .map(|project| project.project_id)
            .collect();
        let mut log = MigrationLog::start(
            actor.subject(),
            actor.email().map(ToOwned::to_owned),
            &project_ids,
            Utc::now(),
        );
        self.migration_log_repository
            .create_migration_log(&log)
            .await?;
        info!(
            migration_id = %log.id,
            subject = actor.subject(),
            projects = project_ids.len(),
            "rbac migration started"
        );

        let mut successful = Vec::new();
        let mut failed = Vec::new();
        let mut warnings = Vec::new();

        for project in &validation.valid_projects {
            let overrides = role_overrides.remove(&project.project_id);
            let (member_roles, ignored) = project.plan.merge_overrides(overrides.as_ref());
            warnings.extend(ignored.into_iter().map(|message| ProjectWarning {
                project_id: project.project_id,
                message,
            }));

            match self
                .migrate_project(actor, &project.plan, member_roles, project.project_id)
                .await
            {
                Ok(()) => {
                    log.record_success(project.project_id);
                    successful.push(project.project_id);
                }
                Err(error) => {
                    warn!(
                        migration_id = %log.id,
                        project_id = %project.project_id,
                        %error,
                        "project migration failed"
                    );
                    log.record_failure(project.project_id, error.to_string());
                    failed.push(FailedProject {
                        project_id: project.project_id,
                        error: error.to_string(),
                    });
                }
            }

            self.migration_log_repository.save_migration_log(&log).await?;
        }

        let (verified, inconsistencies) = self.verify_projects(&successful).await?;
        let results = MigrationResults {
            successful: successful.len(),
            failed: failed.len(),
            verified: verified.len(),
            inconsistent: inconsistencies.len(),
        };
        log.finish(results.clone(), Utc::now());
        self.migration_log_repository.save_migration_log(&log).await?;
        info!(
            migration_id = %log.id,
            status = log.status.as_str(),
            successful = results.successful,
            failed = results.failed,
            inconsistent = results.inconsistent,
            "rbac migration finished"
        );

        Ok(MigrationRunReport {
            migration_id: log.id,
            status: log.status,
            validation,
            successful,
            failed,
            verified,
            inconsistencies,
            warnings,
            results,
        })
    }

    async fn migrate_project(
        &self,
        actor: &UserIdentity,
        plan: &MigrationPlan,
        member_roles: BTreeMap<String, ProjectRole>,
        project_id: ProjectId,
    ) -> AppResult<()> {
        let now = Utc::now();

        commit_with_retry(
            self.project_repository.as_ref(),
            project_id,
            |document| {
                if document.member_roles.is_some() {
                    return Err(AppError::FailedPrecondition(format!(
                        "project '{project_id}' was migrated concurrently"
                    )));
                }

                let mut project = Project::from_document(document)?;
                project.install_member_roles(&plan.members, member_roles.clone(), now)?;
                let event = AuditEvent {
                    project_id,
                    subject: actor.subject().to_owned(),
                    action: AuditAction::RbacMigration,
                    target_subject: None,
                    old_role: None,
                    new_role: None,
                    removed_role: None,
                    detail: Some(format!(
                        "migrated {} members to role-based access",
                        member_roles.len()
                    )),
                };

                Ok(StagedWrite::project(project, ()).with_audit_event(event))
            },
        )
        .await
    }
}
