use async_trait::async_trait;

use taskflow_core::{AppResult, ProjectId};
use taskflow_domain::{AuditAction, ProjectRole};

/// Immutable audit event payload emitted by application services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Project scope for the event.
    pub project_id: ProjectId,
    /// Subject that performed the action.
    pub subject: String,
    /// Stable audit action identifier.
    pub action: AuditAction,
    /// Member affected by the action.
    pub target_subject: Option<String>,
    /// Role before a role change.
    pub old_role: Option<ProjectRole>,
    /// Role after a role change.
    pub new_role: Option<ProjectRole>,
    /// Role held by a removed member.
    pub removed_role: Option<ProjectRole>,
    /// Optional human-readable detail.
    pub detail: Option<String>,
}

/// Audit log entry projection for project views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogEntry {
    /// Stable event identifier.
    pub event_id: String,
    /// Project scope.
    pub project_id: ProjectId,
    /// Actor subject.
    pub subject: String,
    /// Stable action identifier.
    pub action: AuditAction,
    /// Affected member.
    pub target_subject: Option<String>,
    /// Role before a role change.
    pub old_role: Option<ProjectRole>,
    /// Role after a role change.
    pub new_role: Option<ProjectRole>,
    /// Role held by a removed member.
    pub removed_role: Option<ProjectRole>,
    /// Optional event detail.
    pub detail: Option<String>,
    /// Store-assigned timestamp in RFC3339.
    pub created_at: String,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

/// Read port for the append-only audit log.
///
/// Events are written only through project commits.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists a project's entries, newest first.
    async fn list_recent_entries(
        &self,
        project_id: ProjectId,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>>;
}
