use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use taskflow_application::ProjectAccessView;
use taskflow_domain::{MemberAccess, ProjectRole};
use ts_rs::TS;

/// Incoming payload for project creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-project-request.ts"
)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// API representation of a project as seen by one caller.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-response.ts"
)]
pub struct ProjectResponse {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub owner: String,
    pub members: Vec<String>,
    /// Absent until the project has been migrated.
    pub member_roles: Option<BTreeMap<String, String>>,
    pub boards: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub migrated_at: Option<String>,
    pub my_role: Option<String>,
    pub needs_migration: bool,
}

impl From<ProjectAccessView> for ProjectResponse {
    fn from(view: ProjectAccessView) -> Self {
        let project = view.project;
        let my_role = match view.access {
            MemberAccess::Role(role) => Some(role.as_str().to_owned()),
            MemberAccess::MigrationRequired | MemberAccess::NotMember => None,
        };

        Self {
            project_id: project.id().to_string(),
            name: project.name().as_str().to_owned(),
            description: project.description().to_owned(),
            owner: project.owner().to_owned(),
            members: project.members().to_vec(),
            member_roles: project.member_roles().map(|roles| {
                roles
                    .iter()
                    .map(|(subject, role)| (subject.clone(), role.as_str().to_owned()))
                    .collect()
            }),
            boards: project.boards().to_vec(),
            created_at: project.created_at().to_rfc3339(),
            updated_at: project.updated_at().to_rfc3339(),
            migrated_at: project.migrated_at().map(|value| value.to_rfc3339()),
            needs_migration: project.needs_migration(),
            my_role,
        }
    }
}

/// Caller's role and the permissions it grants in one project.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-permissions-response.ts"
)]
pub struct ProjectPermissionsResponse {
    pub project_id: String,
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

impl ProjectPermissionsResponse {
    pub fn new(project_id: String, role: Option<ProjectRole>) -> Self {
        Self {
            project_id,
            role: role.map(|role| role.as_str().to_owned()),
            permissions: role
                .map(|role| {
                    role.permissions()
                        .iter()
                        .map(|permission| permission.as_str().to_owned())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
