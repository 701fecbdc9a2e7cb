//! Planning and bookkeeping for upgrading legacy projects to role-based access.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use taskflow_core::{AppError, ProjectId};
use uuid::Uuid;

use crate::project::ProjectDocument;
use crate::role::ProjectRole;

/// Role suggested for every resolvable legacy member.
pub const DEFAULT_MIGRATION_ROLE: ProjectRole = ProjectRole::Editor;

/// Rough per-project duration used for dry-run estimates.
pub const ESTIMATED_SECONDS_PER_PROJECT: u64 = 2;

/// Window during which an `in_progress` run blocks a new one for the same user.
pub const MIGRATION_LOCK_MINUTES: i64 = 15;

/// Named post-migration consistency checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyCheck {
    /// `member_roles` exists.
    MemberRolesPresent,
    /// `owner` is set.
    OwnerPresent,
    /// The owner has no entry in `member_roles`.
    OwnerNotInMemberRoles,
    /// Every non-owner member has a role entry.
    MembersHaveRoles,
    /// No role entry exists for a non-member.
    NoOrphanedRoles,
}

impl ConsistencyCheck {
    /// Returns the stable name reported to callers.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemberRolesPresent => "member_roles_present",
            Self::OwnerPresent => "owner_present",
            Self::OwnerNotInMemberRoles => "owner_not_in_member_roles",
            Self::MembersHaveRoles => "members_have_roles",
            Self::NoOrphanedRoles => "no_orphaned_roles",
        }
    }
}

/// Target state computed for one valid legacy project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// Owner user id.
    pub owner: String,
    /// Final member list: owner first when it was missing, deduplicated,
    /// unresolvable ids dropped.
    pub members: Vec<String>,
    /// Suggested role per non-owner member.
    pub suggested_roles: BTreeMap<String, ProjectRole>,
}

impl MigrationPlan {
    /// Merges caller overrides into the suggested roles.
    ///
    /// Overrides for the owner, for ids outside the final member set, or that
    /// try to grant `owner` are ignored and reported as warnings.
    #[must_use]
    pub fn merge_overrides(
        &self,
        overrides: Option<&BTreeMap<String, ProjectRole>>,
    ) -> (BTreeMap<String, ProjectRole>, Vec<String>) {
        let mut roles = self.suggested_roles.clone();
        let mut warnings = Vec::new();

        for (subject, role) in overrides.into_iter().flatten() {
            if *subject == self.owner {
                warnings.push(format!(
                    "Ignored role override for owner {subject}: owner role is implicit"
                ));
                continue;
            }

            if !roles.contains_key(subject) {
                warnings.push(format!(
                    "Ignored role override for {subject}: not a member after migration"
                ));
                continue;
            }

            if !role.is_assignable() {
                warnings.push(format!(
                    "Ignored role override for {subject}: owner role cannot be granted"
                ));
                continue;
            }

            roles.insert(subject.clone(), *role);
        }

        (roles, warnings)
    }
}

/// Result of validating one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Project already has a role map; skipped.
    AlreadyMigrated,
    /// Project cannot be migrated.
    Invalid {
        /// Blocking errors.
        errors: Vec<String>,
    },
    /// Project can be migrated with this plan.
    Valid(MigrationPlan),
}

/// Validation report for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectValidation {
    /// Project identifier.
    pub project_id: ProjectId,
    /// Project display name.
    pub project_name: String,
    /// Outcome.
    pub outcome: ValidationOutcome,
    /// Non-blocking findings that were auto-corrected.
    pub warnings: Vec<String>,
}

/// Validates a legacy project and computes its migration plan.
///
/// `is_resolvable` answers whether a member id is known to the identity
/// provider. The owner is always kept.
pub fn plan_project_migration(
    document: &ProjectDocument,
    is_resolvable: impl Fn(&str) -> bool,
) -> ProjectValidation {
    let mut validation = ProjectValidation {
        project_id: document.id,
        project_name: document.name.clone(),
        outcome: ValidationOutcome::AlreadyMigrated,
        warnings: Vec::new(),
    };

    if document.member_roles.is_some() {
        return validation;
    }

    let owner = document
        .owner
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let mut errors = Vec::new();
    if owner.is_none() {
        errors.push("Missing owner field".to_owned());
    }
    if document.members.is_none() {
        errors.push("Missing or invalid members array".to_owned());
    }

    let (Some(owner), Some(members)) = (owner, document.members.as_ref()) else {
        validation.outcome = ValidationOutcome::Invalid { errors };
        return validation;
    };

    if !members.iter().any(|member| member == owner) {
        validation
            .warnings
            .push(format!("Owner {owner} was not in members and will be added"));
    }

    let mut final_members = Vec::with_capacity(members.len() + 1);
    if !members.iter().any(|member| member == owner) {
        final_members.push(owner.to_owned());
    }

    let mut suggested_roles = BTreeMap::new();
    let mut duplicates_reported = Vec::new();

    for member in members {
        let member = member.trim();
        if member.is_empty() {
            validation
                .warnings
                .push("Empty member id was dropped".to_owned());
            continue;
        }

        if final_members.iter().any(|existing| existing == member) {
            if !duplicates_reported.contains(&member) {
                validation
                    .warnings
                    .push(format!("Duplicate member {member} will be deduplicated"));
                duplicates_reported.push(member);
            }
            continue;
        }

        if member != owner && !is_resolvable(member) {
            validation.warnings.push(format!(
                "Member {member} could not be resolved and will be dropped"
            ));
            continue;
        }

        final_members.push(member.to_owned());
        if member != owner {
            suggested_roles.insert(member.to_owned(), DEFAULT_MIGRATION_ROLE);
        }
    }

    validation.outcome = ValidationOutcome::Valid(MigrationPlan {
        owner: owner.to_owned(),
        members: final_members,
        suggested_roles,
    });
    validation
}

/// Dry-run plan summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DryRunPlan {
    /// Projects that would be migrated.
    pub projects_to_migrate: usize,
    /// Rough duration of a live run.
    pub estimated_duration_seconds: u64,
    /// Projects that would fail validation.
    pub projects_that_would_fail: usize,
}

impl DryRunPlan {
    /// Builds the plan from validation counts.
    #[must_use]
    pub fn new(projects_to_migrate: usize, projects_that_would_fail: usize) -> Self {
        Self {
            projects_to_migrate,
            estimated_duration_seconds: ESTIMATED_SECONDS_PER_PROJECT
                .saturating_mul(u64::try_from(projects_to_migrate).unwrap_or(u64::MAX)),
            projects_that_would_fail,
        }
    }
}

/// State of a migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationStatus {
    /// Run has started and not finished.
    InProgress,
    /// Every valid project migrated.
    Completed,
    /// At least one project failed.
    CompletedWithErrors,
}

impl MigrationStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
        }
    }
}

impl FromStr for MigrationStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "completed_with_errors" => Ok(Self::CompletedWithErrors),
            _ => Err(AppError::Validation(format!(
                "unknown migration status '{value}'"
            ))),
        }
    }
}

/// Per-project progress state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectMigrationState {
    /// Not processed yet.
    Pending,
    /// Migrated.
    Completed,
    /// Migration failed.
    Failed,
}

/// Progress entry for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProgress {
    /// Current state.
    pub state: ProjectMigrationState,
    /// Failure message.
    pub error: Option<String>,
}

/// One verification inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inconsistency {
    /// Project identifier.
    pub project_id: ProjectId,
    /// Names of the failed checks.
    pub failed_checks: Vec<String>,
}

/// Final summary of a live run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationResults {
    /// Projects migrated.
    pub successful: usize,
    /// Projects that failed.
    pub failed: usize,
    /// Migrated projects that passed every consistency check.
    pub verified: usize,
    /// Migrated projects with at least one failed check.
    pub inconsistent: usize,
}

/// Record of one live migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationLog {
    /// Run identifier.
    pub id: Uuid,
    /// User who ran the migration.
    pub subject: String,
    /// Email of that user, if known.
    pub email: Option<String>,
    /// Run state.
    pub status: MigrationStatus,
    /// Start timestamp.
    pub started_at: DateTime<Utc>,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Number of projects scheduled for migration.
    pub total_projects: usize,
    /// Progress keyed by project id.
    pub progress: BTreeMap<String, ProjectProgress>,
    /// Summary, set on completion.
    pub results: Option<MigrationResults>,
}

impl MigrationLog {
    /// Starts a run covering the given projects.
    #[must_use]
    pub fn start(
        subject: impl Into<String>,
        email: Option<String>,
        project_ids: &[ProjectId],
        now: DateTime<Utc>,
    ) -> Self {
        let progress = project_ids
            .iter()
            .map(|project_id| {
                (
                    project_id.to_string(),
                    ProjectProgress {
                        state: ProjectMigrationState::Pending,
                        error: None,
                    },
                )
            })
            .collect();

        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            email,
            status: MigrationStatus::InProgress,
            started_at: now,
            completed_at: None,
            total_projects: project_ids.len(),
            progress,
            results: None,
        }
    }

    /// Returns whether this run still blocks a new run at `now`.
    #[must_use]
    pub fn blocks_new_run(&self, now: DateTime<Utc>) -> bool {
        self.status == MigrationStatus::InProgress
            && now - self.started_at < Duration::minutes(MIGRATION_LOCK_MINUTES)
    }

    /// Marks a project as migrated.
    pub fn record_success(&mut self, project_id: ProjectId) {
        self.progress.insert(
            project_id.to_string(),
            ProjectProgress {
                state: ProjectMigrationState::Completed,
                error: None,
            },
        );
    }

    /// Marks a project as failed.
    pub fn record_failure(&mut self, project_id: ProjectId, error: impl Into<String>) {
        self.progress.insert(
            project_id.to_string(),
            ProjectProgress {
                state: ProjectMigrationState::Failed,
                error: Some(error.into()),
            },
        );
    }

    /// Stamps the final status and summary.
    pub fn finish(&mut self, results: MigrationResults, now: DateTime<Utc>) {
        self.status = if results.failed == 0 {
            MigrationStatus::Completed
        } else {
            MigrationStatus::CompletedWithErrors
        };
        self.completed_at = Some(now);
        self.results = Some(results);
    }
}
