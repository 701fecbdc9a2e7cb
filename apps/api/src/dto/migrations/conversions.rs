use std::collections::BTreeMap;
use std::str::FromStr;

use taskflow_application::{
    FailedProject, InvalidProject, MigrateProjectsInput, MigratedProject, MigrationNeed,
    MigrationReport, MigrationRunReport, ProjectWarning, ValidProject, ValidationReport,
};
use taskflow_core::{AppError, ProjectId};
use taskflow_domain::{
    DryRunPlan, Inconsistency, MigrationLog, MigrationResults, ProjectMigrationState,
    ProjectProgress, ProjectRole,
};

use super::types::{
    DryRunPlanResponse, FailedProjectResponse, InconsistencyResponse, InvalidProjectResponse,
    MigratedProjectResponse, MigrateProjectsRequest, MigrationLogResponse, MigrationNeedResponse,
    MigrationReportResponse, MigrationResultsResponse, MigrationRunResponse,
    ProjectProgressResponse, ProjectWarningResponse, ValidProjectResponse,
    ValidationReportResponse,
};

impl TryFrom<MigrateProjectsRequest> for MigrateProjectsInput {
    type Error = AppError;

    fn try_from(request: MigrateProjectsRequest) -> Result<Self, Self::Error> {
        let mut role_overrides = BTreeMap::new();
        for (project_id, roles) in request.role_mapping.unwrap_or_default() {
            let project_id = ProjectId::from_str(project_id.as_str())?;
            let roles = roles
                .into_iter()
                .map(|(subject, role)| {
                    ProjectRole::from_transport(role.as_str()).map(|role| (subject, role))
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            role_overrides.insert(project_id, roles);
        }

        Ok(Self {
            dry_run: request.dry_run,
            role_overrides,
        })
    }
}

fn role_names(roles: BTreeMap<String, ProjectRole>) -> BTreeMap<String, String> {
    roles
        .into_iter()
        .map(|(subject, role)| (subject, role.as_str().to_owned()))
        .collect()
}

impl From<ValidProject> for ValidProjectResponse {
    fn from(value: ValidProject) -> Self {
        Self {
            project_id: value.project_id.to_string(),
            project_name: value.project_name,
            owner: value.plan.owner,
            members: value.plan.members,
            suggested_roles: role_names(value.plan.suggested_roles),
        }
    }
}

impl From<InvalidProject> for InvalidProjectResponse {
    fn from(value: InvalidProject) -> Self {
        Self {
            project_id: value.project_id.to_string(),
            project_name: value.project_name,
            errors: value.errors,
        }
    }
}

impl From<MigratedProject> for MigratedProjectResponse {
    fn from(value: MigratedProject) -> Self {
        Self {
            project_id: value.project_id.to_string(),
            project_name: value.project_name,
        }
    }
}

impl From<ProjectWarning> for ProjectWarningResponse {
    fn from(value: ProjectWarning) -> Self {
        Self {
            project_id: value.project_id.to_string(),
            message: value.message,
        }
    }
}

impl From<ValidationReport> for ValidationReportResponse {
    fn from(value: ValidationReport) -> Self {
        Self {
            valid_projects: value.valid_projects.into_iter().map(Into::into).collect(),
            invalid_projects: value.invalid_projects.into_iter().map(Into::into).collect(),
            already_migrated: value.already_migrated.into_iter().map(Into::into).collect(),
            warnings: value.warnings.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<DryRunPlan> for DryRunPlanResponse {
    fn from(value: DryRunPlan) -> Self {
        Self {
            projects_to_migrate: value.projects_to_migrate,
            estimated_duration_seconds: value.estimated_duration_seconds,
            projects_that_would_fail: value.projects_that_would_fail,
        }
    }
}

impl From<FailedProject> for FailedProjectResponse {
    fn from(value: FailedProject) -> Self {
        Self {
            project_id: value.project_id.to_string(),
            error: value.error,
        }
    }
}

impl From<Inconsistency> for InconsistencyResponse {
    fn from(value: Inconsistency) -> Self {
        Self {
            project_id: value.project_id.to_string(),
            failed_checks: value.failed_checks,
        }
    }
}

impl From<MigrationResults> for MigrationResultsResponse {
    fn from(value: MigrationResults) -> Self {
        Self {
            successful: value.successful,
            failed: value.failed,
            verified: value.verified,
            inconsistent: value.inconsistent,
        }
    }
}

impl From<MigrationRunReport> for MigrationRunResponse {
    fn from(value: MigrationRunReport) -> Self {
        Self {
            migration_id: value.migration_id.to_string(),
            status: value.status.as_str().to_owned(),
            validation: value.validation.into(),
            successful: value
                .successful
                .into_iter()
                .map(|project_id| project_id.to_string())
                .collect(),
            failed: value.failed.into_iter().map(Into::into).collect(),
            verified: value
                .verified
                .into_iter()
                .map(|project_id| project_id.to_string())
                .collect(),
            inconsistencies: value.inconsistencies.into_iter().map(Into::into).collect(),
            warnings: value.warnings.into_iter().map(Into::into).collect(),
            results: value.results.into(),
        }
    }
}

impl From<MigrationReport> for MigrationReportResponse {
    fn from(value: MigrationReport) -> Self {
        match value {
            MigrationReport::DryRun { validation, plan } => Self::DryRun {
                validation: validation.into(),
                plan: plan.into(),
            },
            MigrationReport::Run(report) => Self::Migration(report.into()),
        }
    }
}

impl From<ProjectProgress> for ProjectProgressResponse {
    fn from(value: ProjectProgress) -> Self {
        let status = match value.state {
            ProjectMigrationState::Pending => "pending",
            ProjectMigrationState::Completed => "completed",
            ProjectMigrationState::Failed => "failed",
        };

        Self {
            status: status.to_owned(),
            error: value.error,
        }
    }
}

impl From<MigrationLog> for MigrationLogResponse {
    fn from(value: MigrationLog) -> Self {
        Self {
            migration_id: value.id.to_string(),
            user_id: value.subject,
            email: value.email,
            status: value.status.as_str().to_owned(),
            started_at: value.started_at.to_rfc3339(),
            completed_at: value.completed_at.map(|value| value.to_rfc3339()),
            total_projects: value.total_projects,
            progress: value
                .progress
                .into_iter()
                .map(|(project_id, progress)| (project_id, progress.into()))
                .collect(),
            results: value.results.map(Into::into),
        }
    }
}

impl From<MigrationNeed> for MigrationNeedResponse {
    fn from(value: MigrationNeed) -> Self {
        Self {
            needs_migration: value.needs_migration,
            total_projects: value.total_projects,
            projects_to_migrate: value.projects_to_migrate,
        }
    }
}

#[cfg(test)]
mod tests {
    use taskflow_application::MigrateProjectsInput;
    use taskflow_core::{AppError, ProjectId};
    use taskflow_domain::ProjectRole;

    use super::MigrateProjectsRequest;

    #[test]
    fn role_mapping_is_parsed_per_project() {
        let project_id = ProjectId::new();
        let request: MigrateProjectsRequest = serde_json::from_value(serde_json::json!({
            "dryRun": false,
            "roleMapping": { project_id.to_string(): { "u2": "Viewer" } }
        }))
        .unwrap_or_else(|_| unreachable!());

        let input = MigrateProjectsInput::try_from(request);
        assert!(matches!(
            input,
            Ok(ref input) if !input.dry_run
                && input.role_overrides.get(&project_id).and_then(|roles| roles.get("u2"))
                    == Some(&ProjectRole::Viewer)
        ));
    }

    #[test]
    fn unknown_override_role_is_rejected() {
        let request: MigrateProjectsRequest = serde_json::from_value(serde_json::json!({
            "dryRun": true,
            "roleMapping": { ProjectId::new().to_string(): { "u2": "superuser" } }
        }))
        .unwrap_or_else(|_| unreachable!());

        assert!(matches!(
            MigrateProjectsInput::try_from(request),
            Err(AppError::Validation(_))
        ));
    }
}
