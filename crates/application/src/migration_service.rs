use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use taskflow_core::{AppError, AppResult, ProjectId, UserIdentity};
use taskflow_domain::{
    AuditAction, ConsistencyCheck, DryRunPlan, Inconsistency, MigrationLog, MigrationPlan,
    MigrationResults, MigrationStatus, Project, ProjectRole, ValidationOutcome,
    plan_project_migration,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::migration_ports::RECENT_MIGRATION_LOG_LIMIT;
use crate::project_writes::{StagedWrite, commit_with_retry};
use crate::{AuditEvent, IdentityProvider, MigrationLogRepository, ProjectRepository};

mod execution;
mod status;
mod validation;
mod verification;

/// Input for a migration request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateProjectsInput {
    /// Stop after validation without writing.
    pub dry_run: bool,
    /// Per-project role overrides keyed by member id.
    pub role_overrides: BTreeMap<ProjectId, BTreeMap<String, ProjectRole>>,
}

/// Project that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProject {
    /// Project id.
    pub project_id: ProjectId,
    /// Project name.
    pub project_name: String,
    /// Computed target state.
    pub plan: MigrationPlan,
}

/// Project that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidProject {
    /// Project id.
    pub project_id: ProjectId,
    /// Project name.
    pub project_name: String,
    /// Blocking errors.
    pub errors: Vec<String>,
}

/// Project skipped because it already has roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedProject {
    /// Project id.
    pub project_id: ProjectId,
    /// Project name.
    pub project_name: String,
}

/// Warning attached to one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectWarning {
    /// Project id.
    pub project_id: ProjectId,
    /// Warning text.
    pub message: String,
}

/// Partition of the caller's owned projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Projects ready to migrate.
    pub valid_projects: Vec<ValidProject>,
    /// Projects that cannot be migrated.
    pub invalid_projects: Vec<InvalidProject>,
    /// Projects skipped because they already have roles.
    pub already_migrated: Vec<MigratedProject>,
    /// Auto-corrected findings.
    pub warnings: Vec<ProjectWarning>,
}

/// Project whose live migration failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedProject {
    /// Project id.
    pub project_id: ProjectId,
    /// Error message.
    pub error: String,
}

/// Outcome of a live migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRunReport {
    /// Migration log id.
    pub migration_id: Uuid,
    /// Final run status.
    pub status: MigrationStatus,
    /// Validation partition the run started from.
    pub validation: ValidationReport,
    /// Projects migrated.
    pub successful: Vec<ProjectId>,
    /// Projects that failed.
    pub failed: Vec<FailedProject>,
    /// Migrated projects that passed every check.
    pub verified: Vec<ProjectId>,
    /// Migrated projects with failed checks.
    pub inconsistencies: Vec<Inconsistency>,
    /// Ignored role overrides.
    pub warnings: Vec<ProjectWarning>,
    /// Summary counts.
    pub results: MigrationResults,
}

/// Result of a migration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationReport {
    /// Validation only.
    DryRun {
        /// Validation partition.
        validation: ValidationReport,
        /// Plan summary.
        plan: DryRunPlan,
    },
    /// Live run.
    Run(MigrationRunReport),
}

/// Whether the caller still owns legacy projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationNeed {
    /// At least one owned project lacks roles.
    pub needs_migration: bool,
    /// Owned projects.
    pub total_projects: usize,
    /// Owned projects lacking roles.
    pub projects_to_migrate: usize,
}

/// Application service upgrading a user's legacy projects to role-based access.
#[derive(Clone)]
pub struct MigrationService {
    project_repository: Arc<dyn ProjectRepository>,
    migration_log_repository: Arc<dyn MigrationLogRepository>,
    identity_provider: Arc<dyn IdentityProvider>,
}

impl MigrationService {
    /// Creates a new migration service.
    #[must_use]
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        migration_log_repository: Arc<dyn MigrationLogRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            project_repository,
            migration_log_repository,
            identity_provider,
        }
    }

    /// Validates the caller's owned projects and, unless dry-running, migrates them.
    pub async fn migrate_my_projects(
        &self,
        actor: &UserIdentity,
        input: MigrateProjectsInput,
    ) -> AppResult<MigrationReport> {
        if input.dry_run {
            let validation = self.validate_owned_projects(actor).await?;
            let plan = DryRunPlan::new(
                validation.valid_projects.len(),
                validation.invalid_projects.len(),
            );
            return Ok(MigrationReport::DryRun { validation, plan });
        }

        self.ensure_no_running_migration(actor).await?;
        let validation = self.validate_owned_projects(actor).await?;
        self.run_migration(actor, validation, input.role_overrides)
            .await
            .map(MigrationReport::Run)
    }
}

#[cfg(test)]
mod tests;
