use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for a migration request.
#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/migrate-projects-request.ts"
)]
pub struct MigrateProjectsRequest {
    pub dry_run: bool,
    /// Role overrides keyed by project id, then member id.
    #[serde(default)]
    pub role_mapping: Option<BTreeMap<String, BTreeMap<String, String>>>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/valid-project-response.ts"
)]
pub struct ValidProjectResponse {
    pub project_id: String,
    pub project_name: String,
    pub owner: String,
    pub members: Vec<String>,
    pub suggested_roles: BTreeMap<String, String>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invalid-project-response.ts"
)]
pub struct InvalidProjectResponse {
    pub project_id: String,
    pub project_name: String,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/migrated-project-response.ts"
)]
pub struct MigratedProjectResponse {
    pub project_id: String,
    pub project_name: String,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-warning-response.ts"
)]
pub struct ProjectWarningResponse {
    pub project_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/validation-report-response.ts"
)]
pub struct ValidationReportResponse {
    pub valid_projects: Vec<ValidProjectResponse>,
    pub invalid_projects: Vec<InvalidProjectResponse>,
    pub already_migrated: Vec<MigratedProjectResponse>,
    pub warnings: Vec<ProjectWarningResponse>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/dry-run-plan-response.ts"
)]
pub struct DryRunPlanResponse {
    pub projects_to_migrate: usize,
    #[ts(type = "number")]
    pub estimated_duration_seconds: u64,
    pub projects_that_would_fail: usize,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/failed-project-response.ts"
)]
pub struct FailedProjectResponse {
    pub project_id: String,
    pub error: String,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/inconsistency-response.ts"
)]
pub struct InconsistencyResponse {
    pub project_id: String,
    pub failed_checks: Vec<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/migration-results-response.ts"
)]
pub struct MigrationResultsResponse {
    pub successful: usize,
    pub failed: usize,
    pub verified: usize,
    pub inconsistent: usize,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/migration-run-response.ts"
)]
pub struct MigrationRunResponse {
    pub migration_id: String,
    pub status: String,
    pub validation: ValidationReportResponse,
    pub successful: Vec<String>,
    pub failed: Vec<FailedProjectResponse>,
    pub verified: Vec<String>,
    pub inconsistencies: Vec<InconsistencyResponse>,
    pub warnings: Vec<ProjectWarningResponse>,
    pub results: MigrationResultsResponse,
}

/// Migration outcome, tagged by phase.
#[derive(Debug, Serialize, TS)]
#[serde(tag = "phase", rename_all = "snake_case")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/migration-report-response.ts"
)]
pub enum MigrationReportResponse {
    DryRun {
        validation: ValidationReportResponse,
        plan: DryRunPlanResponse,
    },
    Migration(MigrationRunResponse),
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-progress-response.ts"
)]
pub struct ProjectProgressResponse {
    pub status: String,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/migration-log-response.ts"
)]
pub struct MigrationLogResponse {
    pub migration_id: String,
    pub user_id: String,
    pub email: Option<String>,
    pub status: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub total_projects: usize,
    pub progress: BTreeMap<String, ProjectProgressResponse>,
    pub results: Option<MigrationResultsResponse>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/migration-need-response.ts"
)]
pub struct MigrationNeedResponse {
    pub needs_migration: bool,
    pub total_projects: usize,
    pub projects_to_migrate: usize,
}
