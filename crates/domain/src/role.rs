use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use taskflow_core::AppError;

/// Privilege tier a user holds inside one project.
///
/// `Owner` is implicit: it is derived from the project's `owner` field and is
/// never stored in the member role map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    /// The single immutable project owner.
    Owner,
    /// Manages project settings and members below admin.
    Admin,
    /// Edits tasks and manages boards.
    Editor,
    /// Read-only access.
    Viewer,
}

impl ProjectRole {
    /// Returns a stable storage value for this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }

    /// Returns the hierarchical level of this role (higher means more privilege).
    #[must_use]
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::Viewer => 1,
            Self::Editor => 2,
            Self::Admin => 3,
            Self::Owner => 4,
        }
    }

    /// Returns roles that may be stored in a member role map.
    #[must_use]
    pub fn assignable() -> &'static [Self] {
        const ASSIGNABLE: &[ProjectRole] =
            &[ProjectRole::Admin, ProjectRole::Editor, ProjectRole::Viewer];

        ASSIGNABLE
    }

    /// Returns whether the role can be granted through invitations or role changes.
    #[must_use]
    pub fn is_assignable(&self) -> bool {
        !matches!(self, Self::Owner)
    }

    /// Returns the fixed permission set for this role.
    #[must_use]
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Self::Owner | Self::Admin => Permission::all(),
            Self::Editor => &[Permission::EditTasks, Permission::ManageBoards],
            Self::Viewer => &[],
        }
    }

    /// Returns whether this role holds the permission.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// Parses a transport value into a role.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl PartialOrd for ProjectRole {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProjectRole {
    fn cmp(&self, other: &Self) -> Ordering {
        self.privilege_level().cmp(&other.privilege_level())
    }
}

impl FromStr for ProjectRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            _ => Err(AppError::Validation(format!(
                "unknown project role '{value}'"
            ))),
        }
    }
}

/// Capabilities checked against a project role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows editing project name, description and settings.
    EditProject,
    /// Allows inviting new members.
    InviteMembers,
    /// Allows removing members and changing their roles.
    RemoveMembers,
    /// Allows creating and editing tasks.
    EditTasks,
    /// Allows creating, reordering and deleting boards and columns.
    ManageBoards,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EditProject => "project.edit",
            Self::InviteMembers => "project.members.invite",
            Self::RemoveMembers => "project.members.remove",
            Self::EditTasks => "project.tasks.edit",
            Self::ManageBoards => "project.boards.manage",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::EditProject,
            Permission::InviteMembers,
            Permission::RemoveMembers,
            Permission::EditTasks,
            Permission::ManageBoards,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "project.edit" | "EDIT_PROJECT" => Ok(Self::EditProject),
            "project.members.invite" | "INVITE_MEMBERS" => Ok(Self::InviteMembers),
            "project.members.remove" | "REMOVE_MEMBERS" => Ok(Self::RemoveMembers),
            "project.tasks.edit" | "EDIT_TASKS" => Ok(Self::EditTasks),
            "project.boards.manage" | "MANAGE_BOARDS" => Ok(Self::ManageBoards),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Rule deciding which roles an actor may hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleGrantPolicy {
    /// New role must be strictly below the actor's own role.
    #[default]
    Strict,
    /// New role may equal the actor's own role (same-tier peer management).
    Peer,
}

impl RoleGrantPolicy {
    /// Returns the configuration value for this policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Peer => "peer",
        }
    }

    /// Parses a configuration value into a policy.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value.trim() {
            "strict" => Ok(Self::Strict),
            "peer" => Ok(Self::Peer),
            _ => Err(AppError::Validation(format!(
                "unknown role grant policy '{value}'"
            ))),
        }
    }
}

/// Returns whether `actor` may move a member from `target` to `new_role`.
///
/// The target must rank strictly below the actor and `owner` can never be
/// granted or revoked through this path.
#[must_use]
pub fn can_modify_role(
    actor: ProjectRole,
    target: ProjectRole,
    new_role: ProjectRole,
    policy: RoleGrantPolicy,
) -> bool {
    if target == ProjectRole::Owner || new_role == ProjectRole::Owner {
        return false;
    }

    if target >= actor {
        return false;
    }

    match policy {
        RoleGrantPolicy::Strict => new_role < actor,
        RoleGrantPolicy::Peer => new_role <= actor,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Permission, ProjectRole, RoleGrantPolicy, can_modify_role};

    #[test]
    fn roles_are_ordered_by_privilege() {
        assert!(ProjectRole::Owner > ProjectRole::Admin);
        assert!(ProjectRole::Admin > ProjectRole::Editor);
        assert!(ProjectRole::Editor > ProjectRole::Viewer);
    }

    #[test]
    fn permission_matrix_matches_policy() {
        for permission in Permission::all() {
            assert!(ProjectRole::Owner.has_permission(*permission));
            assert!(ProjectRole::Admin.has_permission(*permission));
            assert!(!ProjectRole::Viewer.has_permission(*permission));
        }

        assert!(ProjectRole::Editor.has_permission(Permission::EditTasks));
        assert!(ProjectRole::Editor.has_permission(Permission::ManageBoards));
        assert!(!ProjectRole::Editor.has_permission(Permission::InviteMembers));
        assert!(!ProjectRole::Editor.has_permission(Permission::RemoveMembers));
        assert!(!ProjectRole::Editor.has_permission(Permission::EditProject));
    }

    #[test]
    fn role_parsing_is_case_insensitive_and_rejects_unknown_values() {
        assert_eq!(ProjectRole::from_str(" Editor ").ok(), Some(ProjectRole::Editor));
        assert!(ProjectRole::from_str("superuser").is_err());
    }

    #[test]
    fn permission_roundtrip_storage_value() {
        for permission in Permission::all() {
            assert_eq!(Permission::from_str(permission.as_str()).ok(), Some(*permission));
        }
        assert_eq!(
            Permission::from_str("INVITE_MEMBERS").ok(),
            Some(Permission::InviteMembers)
        );
    }

    #[test]
    fn strict_policy_only_grants_roles_below_the_actor() {
        let strict = RoleGrantPolicy::Strict;
        assert!(can_modify_role(
            ProjectRole::Admin,
            ProjectRole::Viewer,
            ProjectRole::Editor,
            strict
        ));
        assert!(!can_modify_role(
            ProjectRole::Admin,
            ProjectRole::Editor,
            ProjectRole::Admin,
            strict
        ));
        assert!(can_modify_role(
            ProjectRole::Owner,
            ProjectRole::Editor,
            ProjectRole::Admin,
            strict
        ));
    }

    #[test]
    fn peer_policy_allows_granting_the_actor_tier() {
        assert!(can_modify_role(
            ProjectRole::Admin,
            ProjectRole::Editor,
            ProjectRole::Admin,
            RoleGrantPolicy::Peer
        ));
        assert!(!can_modify_role(
            ProjectRole::Admin,
            ProjectRole::Admin,
            ProjectRole::Editor,
            RoleGrantPolicy::Peer
        ));
    }

    #[test]
    fn owner_role_is_never_granted_or_revoked() {
        for policy in [RoleGrantPolicy::Strict, RoleGrantPolicy::Peer] {
            assert!(!can_modify_role(
                ProjectRole::Owner,
                ProjectRole::Admin,
                ProjectRole::Owner,
                policy
            ));
            assert!(!can_modify_role(
                ProjectRole::Owner,
                ProjectRole::Owner,
                ProjectRole::Admin,
                policy
            ));
        }
    }

    #[test]
    fn editors_and_viewers_cannot_modify_anyone_above_viewer() {
        for policy in [RoleGrantPolicy::Strict, RoleGrantPolicy::Peer] {
            for target in ProjectRole::assignable() {
                for new_role in ProjectRole::assignable() {
                    assert!(!can_modify_role(
                        ProjectRole::Viewer,
                        *target,
                        *new_role,
                        policy
                    ));
                }
            }
        }
    }

    #[test]
    fn grant_policy_parses_configuration_values() {
        assert_eq!(RoleGrantPolicy::parse("peer").ok(), Some(RoleGrantPolicy::Peer));
        assert_eq!(RoleGrantPolicy::default(), RoleGrantPolicy::Strict);
        assert!(RoleGrantPolicy::parse("loose").is_err());
    }
}
