//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod invitation;
mod migration;
mod project;
mod role;
mod user;

pub use audit::AuditAction;
pub use invitation::{
    DEFAULT_INVITATION_TTL_DAYS, Invitation, InvitationDraft, InvitationId, InvitationStatus,
};
pub use migration::{
    ConsistencyCheck, DEFAULT_MIGRATION_ROLE, DryRunPlan, ESTIMATED_SECONDS_PER_PROJECT,
    Inconsistency, MIGRATION_LOCK_MINUTES, MigrationLog, MigrationPlan, MigrationResults,
    MigrationStatus, ProjectMigrationState, ProjectProgress, ProjectValidation,
    ValidationOutcome, plan_project_migration,
};
pub use project::{MemberAccess, Project, ProjectDocument};
pub use role::{Permission, ProjectRole, RoleGrantPolicy, can_modify_role};
pub use user::{EmailAddress, UNKNOWN_MEMBER_DISPLAY_NAME, UserProfile};
