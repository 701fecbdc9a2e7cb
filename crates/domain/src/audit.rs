use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskflow_core::AppError;

/// Stable audit actions emitted by membership use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a member's role changes.
    RoleChanged,
    /// Emitted when a member is removed from a project.
    MemberRemoved,
    /// Emitted when a legacy project is upgraded to role-based access.
    RbacMigration,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleChanged => "role_changed",
            Self::MemberRemoved => "member_removed",
            Self::RbacMigration => "rbac_migration",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "role_changed" => Ok(Self::RoleChanged),
            "member_removed" => Ok(Self::MemberRemoved),
            "rbac_migration" => Ok(Self::RbacMigration),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}
