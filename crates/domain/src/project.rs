//! Project membership aggregate and the pure access evaluator.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskflow_core::{AppError, AppResult, NonEmptyString, ProjectId};

use crate::migration::ConsistencyCheck;
use crate::role::{Permission, ProjectRole};

/// Raw project document as persisted.
///
/// Legacy documents may lack `owner`, `members` or `member_roles`; the
/// migration engine reads this shape directly, every other use-case goes
/// through [`Project`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDocument {
    /// Project identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Owner user id.
    pub owner: Option<String>,
    /// Member user ids, owner included.
    pub members: Option<Vec<String>>,
    /// Roles for non-owner members; `None` on legacy projects.
    pub member_roles: Option<BTreeMap<String, ProjectRole>>,
    /// Ordered board ids.
    pub boards: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Set once the project was upgraded by the migration engine.
    pub migrated_at: Option<DateTime<Utc>>,
    /// Storage revision used for optimistic concurrency.
    pub revision: i64,
}

impl ProjectDocument {
    /// Returns the consistency checks this document fails.
    ///
    /// An empty result means the document satisfies the membership invariants.
    #[must_use]
    pub fn failed_consistency_checks(&self) -> Vec<ConsistencyCheck> {
        let mut failed = Vec::new();
        let owner = self
            .owner
            .as_deref()
            .filter(|value| !value.trim().is_empty());
        let members = self.members.as_deref().unwrap_or_default();

        let Some(member_roles) = self.member_roles.as_ref() else {
            failed.push(ConsistencyCheck::MemberRolesPresent);
            if owner.is_none() {
                failed.push(ConsistencyCheck::OwnerPresent);
            }
            return failed;
        };

        let Some(owner) = owner else {
            failed.push(ConsistencyCheck::OwnerPresent);
            return failed;
        };

        if member_roles.contains_key(owner) {
            failed.push(ConsistencyCheck::OwnerNotInMemberRoles);
        }

        if members
            .iter()
            .any(|member| member != owner && !member_roles.contains_key(member))
        {
            failed.push(ConsistencyCheck::MembersHaveRoles);
        }

        if member_roles
            .keys()
            .any(|subject| !members.iter().any(|member| member == subject))
        {
            failed.push(ConsistencyCheck::NoOrphanedRoles);
        }

        failed
    }
}

/// How a user relates to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAccess {
    /// User holds a resolvable role.
    Role(ProjectRole),
    /// User is listed on a legacy project that has no role map yet.
    MigrationRequired,
    /// User is not a member.
    NotMember,
}

/// Project with validated ownership and membership data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    id: ProjectId,
    name: NonEmptyString,
    description: String,
    owner: String,
    members: Vec<String>,
    member_roles: Option<BTreeMap<String, ProjectRole>>,
    boards: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    migrated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Creates a new project owned by `owner`, with an empty role map.
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let owner = NonEmptyString::new(owner)?;
        let owner = String::from(owner);

        Ok(Self {
            id: ProjectId::new(),
            name: NonEmptyString::new(name)?,
            description: description.into().trim().to_owned(),
            members: vec![owner.clone()],
            owner,
            member_roles: Some(BTreeMap::new()),
            boards: Vec::new(),
            created_at: now,
            updated_at: now,
            migrated_at: None,
        })
    }

    /// Builds a project from a persisted document.
    ///
    /// Documents missing the owner or member list cannot be evaluated and must
    /// go through the migration engine first.
    pub fn from_document(document: ProjectDocument) -> AppResult<Self> {
        let owner = document
            .owner
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                AppError::FailedPrecondition(format!(
                    "project '{}' has no owner and must be migrated",
                    document.id
                ))
            })?;
        let members = document.members.ok_or_else(|| {
            AppError::FailedPrecondition(format!(
                "project '{}' has no member list and must be migrated",
                document.id
            ))
        })?;
        let name = NonEmptyString::new(document.name).map_err(|_| {
            AppError::Internal(format!("project '{}' has an empty name", document.id))
        })?;

        Ok(Self {
            id: document.id,
            name,
            description: document.description,
            owner,
            members,
            member_roles: document.member_roles,
            boards: document.boards,
            created_at: document.created_at,
            updated_at: document.updated_at,
            migrated_at: document.migrated_at,
        })
    }

    /// Converts the project back to its persisted shape.
    #[must_use]
    pub fn into_document(self, revision: i64) -> ProjectDocument {
        ProjectDocument {
            id: self.id,
            name: self.name.into(),
            description: self.description,
            owner: Some(self.owner),
            members: Some(self.members),
            member_roles: self.member_roles,
            boards: self.boards,
            created_at: self.created_at,
            updated_at: self.updated_at,
            migrated_at: self.migrated_at,
            revision,
        }
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn id(&self) -> ProjectId {
        self.id
    }

    /// Returns the project display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the project description.
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    /// Returns the owner user id.
    #[must_use]
    pub fn owner(&self) -> &str {
        self.owner.as_str()
    }

    /// Returns member user ids in insertion order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Returns the role map, or `None` for legacy projects.
    #[must_use]
    pub fn member_roles(&self) -> Option<&BTreeMap<String, ProjectRole>> {
        self.member_roles.as_ref()
    }

    /// Returns board ids in display order.
    #[must_use]
    pub fn boards(&self) -> &[String] {
        &self.boards
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last mutation timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns when the project was migrated, if ever.
    #[must_use]
    pub fn migrated_at(&self) -> Option<DateTime<Utc>> {
        self.migrated_at
    }

    /// Returns whether the project predates role-based access.
    #[must_use]
    pub fn needs_migration(&self) -> bool {
        self.member_roles.is_none()
    }

    /// Returns whether the user is the owner or listed as a member.
    #[must_use]
    pub fn is_member(&self, subject: &str) -> bool {
        self.owner == subject || self.members.iter().any(|member| member == subject)
    }

    /// Resolves the user's role.
    ///
    /// The owner always resolves to [`ProjectRole::Owner`]; everyone else is
    /// looked up in the role map only, never in the member list.
    #[must_use]
    pub fn role_of(&self, subject: &str) -> Option<ProjectRole> {
        if self.owner == subject {
            return Some(ProjectRole::Owner);
        }

        self.member_roles
            .as_ref()
            .and_then(|roles| roles.get(subject).copied())
    }

    /// Resolves the user's access, separating legacy members from outsiders.
    #[must_use]
    pub fn access_of(&self, subject: &str) -> MemberAccess {
        match self.role_of(subject) {
            Some(role) => MemberAccess::Role(role),
            None if self.member_roles.is_none() && self.is_member(subject) => {
                MemberAccess::MigrationRequired
            }
            None => MemberAccess::NotMember,
        }
    }

    /// Returns whether the user's role grants the permission.
    #[must_use]
    pub fn has_permission(&self, subject: &str, permission: Permission) -> bool {
        self.role_of(subject)
            .is_some_and(|role| role.has_permission(permission))
    }

    /// Adds a member with a role.
    pub fn add_member(
        &mut self,
        subject: &str,
        role: ProjectRole,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if !role.is_assignable() {
            return Err(AppError::Validation(
                "the owner role cannot be granted".to_owned(),
            ));
        }

        if self.is_member(subject) {
            return Err(AppError::Conflict(format!(
                "user '{subject}' is already a member of project '{}'",
                self.id
            )));
        }

        let member_roles = self.member_roles_mut()?;
        member_roles.insert(subject.to_owned(), role);
        self.members.push(subject.to_owned());
        self.updated_at = now;

        Ok(())
    }

    /// Replaces a member's role and returns the previous one.
    pub fn set_member_role(
        &mut self,
        subject: &str,
        role: ProjectRole,
        now: DateTime<Utc>,
    ) -> AppResult<ProjectRole> {
        if !role.is_assignable() {
            return Err(AppError::Validation(
                "the owner role cannot be granted".to_owned(),
            ));
        }

        if self.owner == subject {
            return Err(AppError::Forbidden(
                "the project owner's role cannot be changed".to_owned(),
            ));
        }

        let project_id = self.id;
        let member_roles = self.member_roles_mut()?;
        let Some(current) = member_roles.get_mut(subject) else {
            return Err(AppError::NotFound(format!(
                "user '{subject}' has no role in project '{project_id}'"
            )));
        };

        let previous = *current;
        *current = role;
        self.updated_at = now;

        Ok(previous)
    }

    /// Removes a member and their role entry, returning the removed role.
    pub fn remove_member(
        &mut self,
        subject: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<ProjectRole>> {
        if self.owner == subject {
            return Err(AppError::Forbidden(
                "the project owner cannot be removed".to_owned(),
            ));
        }

        if !self.is_member(subject) {
            return Err(AppError::NotFound(format!(
                "user '{subject}' is not a member of project '{}'",
                self.id
            )));
        }

        self.members.retain(|member| member != subject);
        let removed_role = self
            .member_roles
            .as_mut()
            .and_then(|roles| roles.remove(subject));
        self.updated_at = now;

        Ok(removed_role)
    }

    /// Installs a role map produced by the migration engine.
    ///
    /// Members are rebuilt as the deduplicated union of the owner and
    /// `members`; role entries for the owner or for non-members are dropped.
    pub fn install_member_roles(
        &mut self,
        members: &[String],
        member_roles: BTreeMap<String, ProjectRole>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.member_roles.is_some() {
            return Err(AppError::FailedPrecondition(format!(
                "project '{}' already has role-based access",
                self.id
            )));
        }

        let mut rebuilt: Vec<String> = Vec::with_capacity(members.len() + 1);
        if !members.iter().any(|member| member == &self.owner) {
            rebuilt.push(self.owner.clone());
        }
        for member in members {
            if !rebuilt.contains(member) {
                rebuilt.push(member.clone());
            }
        }

        let mut roles = BTreeMap::new();
        for member in rebuilt.iter().filter(|member| **member != self.owner) {
            let role = member_roles.get(member).copied().ok_or_else(|| {
                AppError::Validation(format!("member '{member}' has no role assignment"))
            })?;
            if !role.is_assignable() {
                return Err(AppError::Validation(format!(
                    "member '{member}' cannot be granted the owner role"
                )));
            }
            roles.insert(member.clone(), role);
        }

        self.members = rebuilt;
        self.member_roles = Some(roles);
        self.updated_at = now;
        self.migrated_at = Some(now);

        Ok(())
    }

    fn member_roles_mut(&mut self) -> AppResult<&mut BTreeMap<String, ProjectRole>> {
        let project_id = self.id;
        self.member_roles.as_mut().ok_or_else(|| {
            AppError::FailedPrecondition(format!(
                "project '{project_id}' must be migrated to role-based access first"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use proptest::prelude::*;
    use taskflow_core::AppError;

    use super::{MemberAccess, Project, ProjectDocument};
    use crate::migration::ConsistencyCheck;
    use crate::role::{Permission, ProjectRole};

    fn project() -> Project {
        Project::new("u1", "Roadmap", "", Utc::now()).unwrap_or_else(|_| unreachable!())
    }

    fn legacy_document(members: Vec<&str>) -> ProjectDocument {
        let mut document = project().into_document(1);
        document.members = Some(members.into_iter().map(ToOwned::to_owned).collect());
        document.member_roles = None;
        document
    }

    #[test]
    fn new_project_lists_only_its_owner() {
        let project = project();
        assert_eq!(project.members(), ["u1".to_owned()]);
        assert_eq!(project.member_roles().map(BTreeMap::len), Some(0));
        assert!(project.into_document(1).failed_consistency_checks().is_empty());
    }

    #[test]
    fn owner_role_is_implicit() {
        let project = project();
        assert_eq!(project.role_of("u1"), Some(ProjectRole::Owner));
        assert!(project.has_permission("u1", Permission::RemoveMembers));
        assert_eq!(project.role_of("u2"), None);
    }

    #[test]
    fn legacy_members_require_migration() {
        let project = Project::from_document(legacy_document(vec!["u1", "u2"]))
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(project.access_of("u2"), MemberAccess::MigrationRequired);
        assert_eq!(project.access_of("u3"), MemberAccess::NotMember);
        assert_eq!(project.access_of("u1"), MemberAccess::Role(ProjectRole::Owner));
        assert!(!project.has_permission("u2", Permission::EditTasks));
    }

    #[test]
    fn adding_member_to_legacy_project_is_a_failed_precondition() {
        let mut project = Project::from_document(legacy_document(vec!["u1"]))
            .unwrap_or_else(|_| unreachable!());

        let result = project.add_member("u2", ProjectRole::Editor, Utc::now());
        assert!(matches!(result, Err(AppError::FailedPrecondition(_))));
    }

    #[test]
    fn add_member_rejects_existing_members_and_owner_role() {
        let mut project = project();
        assert!(matches!(
            project.add_member("u1", ProjectRole::Editor, Utc::now()),
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            project.add_member("u2", ProjectRole::Owner, Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn remove_member_drops_role_entry() {
        let mut project = project();
        assert!(project.add_member("u2", ProjectRole::Viewer, Utc::now()).is_ok());

        let removed = project.remove_member("u2", Utc::now());
        assert!(matches!(removed, Ok(Some(ProjectRole::Viewer))));
        assert!(!project.is_member("u2"));
        assert!(project.member_roles().is_some_and(BTreeMap::is_empty));
    }

    #[test]
    fn owner_cannot_be_removed_or_reassigned() {
        let mut project = project();
        assert!(matches!(
            project.remove_member("u1", Utc::now()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            project.set_member_role("u1", ProjectRole::Admin, Utc::now()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn install_member_roles_rebuilds_members_with_owner_first_when_missing() {
        let mut project = Project::from_document(legacy_document(vec!["u2", "u2", "u3"]))
            .unwrap_or_else(|_| unreachable!());
        let roles = BTreeMap::from([
            ("u2".to_owned(), ProjectRole::Editor),
            ("u3".to_owned(), ProjectRole::Viewer),
        ]);

        let result =
            project.install_member_roles(&["u2".to_owned(), "u3".to_owned()], roles, Utc::now());
        assert!(result.is_ok());
        assert_eq!(project.members(), ["u1", "u2", "u3"].map(ToOwned::to_owned));
        assert!(project.migrated_at().is_some());
        assert!(project.into_document(2).failed_consistency_checks().is_empty());
    }

    #[test]
    fn consistency_checks_report_orphans_and_owner_entries() {
        let mut document = project().into_document(1);
        document.member_roles = Some(BTreeMap::from([
            ("u1".to_owned(), ProjectRole::Admin),
            ("ghost".to_owned(), ProjectRole::Viewer),
        ]));

        let failed = document.failed_consistency_checks();
        assert!(failed.contains(&ConsistencyCheck::OwnerNotInMemberRoles));
        assert!(failed.contains(&ConsistencyCheck::NoOrphanedRoles));
        assert!(!failed.contains(&ConsistencyCheck::MembersHaveRoles));
    }

    #[derive(Debug, Clone)]
    enum Mutation {
        Add(u8, ProjectRole),
        SetRole(u8, ProjectRole),
        Remove(u8),
    }

    fn role_strategy() -> impl Strategy<Value = ProjectRole> {
        prop_oneof![
            Just(ProjectRole::Owner),
            Just(ProjectRole::Admin),
            Just(ProjectRole::Editor),
            Just(ProjectRole::Viewer),
        ]
    }

    fn mutation_strategy() -> impl Strategy<Value = Mutation> {
        prop_oneof![
            (0u8..6, role_strategy()).prop_map(|(user, role)| Mutation::Add(user, role)),
            (0u8..6, role_strategy()).prop_map(|(user, role)| Mutation::SetRole(user, role)),
            (0u8..6).prop_map(Mutation::Remove),
        ]
    }

    proptest! {
        #[test]
        fn membership_invariants_hold_after_any_mutation_sequence(
            mutations in proptest::collection::vec(mutation_strategy(), 0..40)
        ) {
            let mut project = project();
            for mutation in mutations {
                let now = Utc::now();
                let _ = match mutation {
                    Mutation::Add(user, role) => {
                        project.add_member(&format!("u{user}"), role, now).map(|_| ())
                    }
                    Mutation::SetRole(user, role) => {
                        project.set_member_role(&format!("u{user}"), role, now).map(|_| ())
                    }
                    Mutation::Remove(user) => {
                        project.remove_member(&format!("u{user}"), now).map(|_| ())
                    }
                };

                prop_assert_eq!(project.role_of("u1"), Some(ProjectRole::Owner));
                prop_assert!(project.members().iter().any(|member| member == "u1"));
                let document = project.clone().into_document(1);
                prop_assert!(document.failed_consistency_checks().is_empty());
            }
        }
    }
}
