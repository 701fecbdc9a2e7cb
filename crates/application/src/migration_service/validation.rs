use super::*;

impl MigrationService {
    /// Partitions the caller's owned projects without writing anything.
    pub(super) async fn validate_owned_projects(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<ValidationReport> {
        let mut documents = self
            .project_repository
            .list_projects_owned_by(actor.subject())
            .await?;
        documents.sort_by(|left, right| left.created_at.cmp(&right.created_at));

        let candidates: BTreeSet<String> = documents
            .iter()
            .filter(|document| document.member_roles.is_none())
            .filter_map(|document| document.members.as_ref())
            .flatten()
            .map(|member| member.trim().to_owned())
            .filter(|member| !member.is_empty())
            .collect();

        let mut resolvable = BTreeSet::new();
        for subject in candidates {
            if self
                .identity_provider
                .resolve_user_by_id(&subject)
                .await?
                .is_some()
            {
                resolvable.insert(subject);
            }
        }

        let mut report = ValidationReport::default();
        for document in &documents {
            let validation =
                plan_project_migration(document, |subject| resolvable.contains(subject));

            report
                .warnings
                .extend(validation.warnings.into_iter().map(|message| ProjectWarning {
                    project_id: validation.project_id,
                    message,
                }));

            match validation.outcome {
                ValidationOutcome::AlreadyMigrated => {
                    report.already_migrated.push(MigratedProject {
                        project_id: validation.project_id,
                        project_name: validation.project_name,
                    });
                }
                ValidationOutcome::Invalid { errors } => {
                    report.invalid_projects.push(InvalidProject {
                        project_id: validation.project_id,
                        project_name: validation.project_name,
                        errors,
                    });
                }
                ValidationOutcome::Valid(plan) => {
                    report.valid_projects.push(ValidProject {
                        project_id: validation.project_id,
                        project_name: validation.project_name,
                        plan,
                    });
                }
            }
        }

        Ok(report)
    }
}
