//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_service;
mod identity_ports;
mod invitation_ports;
mod invitation_service;
mod membership_service;
mod migration_ports;
mod migration_service;
mod project_ports;
mod project_service;
mod project_writes;

#[cfg(test)]
mod test_support;

pub use audit_ports::{AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository};
pub use authorization_service::AuthorizationService;
pub use identity_ports::IdentityProvider;
pub use invitation_ports::InvitationRepository;
pub use invitation_service::{InvitationReceipt, InvitationService, InviteUserInput};
pub use membership_service::{MembershipService, ProjectMember, RoleChange};
pub use migration_ports::{MigrationLogRepository, RECENT_MIGRATION_LOG_LIMIT};
pub use migration_service::{
    FailedProject, InvalidProject, MigrateProjectsInput, MigratedProject, MigrationNeed,
    MigrationReport, MigrationRunReport, MigrationService, ProjectWarning, ValidProject,
    ValidationReport,
};
pub use project_ports::{ProjectRepository, ProjectWrite, WriteOutcome};
pub use project_service::{CreateProjectInput, ProjectAccessView, ProjectService};
