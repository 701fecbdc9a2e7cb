use super::*;

impl MigrationService {
    /// Re-reads migrated projects and runs the consistency checks.
    pub(super) async fn verify_projects(
        &self,
        project_ids: &[ProjectId],
    ) -> AppResult<(Vec<ProjectId>, Vec<Inconsistency>)> {
        let mut verified = Vec::new();
        let mut inconsistencies = Vec::new();

        for project_id in project_ids {
            let failed_checks = match self.project_repository.find_project(*project_id).await? {
                Some(document) => document.failed_consistency_checks(),
                None => vec![
                    ConsistencyCheck::MemberRolesPresent,
                    ConsistencyCheck::OwnerPresent,
                ],
            };

            if failed_checks.is_empty() {
                verified.push(*project_id);
                continue;
            }

            inconsistencies.push(Inconsistency {
                project_id: *project_id,
                failed_checks: failed_checks
                    .iter()
                    .map(|check| check.as_str().to_owned())
                    .collect(),
            });
        }

        Ok((verified, inconsistencies))
    }
}
