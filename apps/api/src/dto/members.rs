use serde::{Deserialize, Serialize};
use taskflow_application::{AuditLogEntry, AuditLogQuery, ProjectMember};
use ts_rs::TS;

/// Optional subset of member ids to resolve.
#[derive(Debug, Default, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-members-request.ts"
)]
pub struct ProjectMembersRequest {
    #[serde(default)]
    pub member_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/project-member-response.ts"
)]
pub struct ProjectMemberResponse {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: String,
    pub role: Option<String>,
}

impl From<ProjectMember> for ProjectMemberResponse {
    fn from(member: ProjectMember) -> Self {
        Self {
            uid: member.subject,
            email: member.email,
            display_name: member.display_name,
            role: member.role.map(|role| role.as_str().to_owned()),
        }
    }
}

#[derive(Debug, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/change-member-role-request.ts"
)]
pub struct ChangeMemberRoleRequest {
    pub new_role: String,
}

#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/membership-message-response.ts"
)]
pub struct MembershipMessageResponse {
    pub success: bool,
    pub message: String,
}

impl MembershipMessageResponse {
    pub fn new(message: String) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

/// Audit log paging parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQueryParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl From<AuditLogQueryParams> for AuditLogQuery {
    fn from(params: AuditLogQueryParams) -> Self {
        let defaults = AuditLogQuery::default();
        Self {
            limit: params.limit.unwrap_or(defaults.limit).clamp(1, 200),
            offset: params.offset.unwrap_or(defaults.offset),
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub event_id: String,
    pub project_id: String,
    pub subject: String,
    pub action: String,
    pub target_user_id: Option<String>,
    pub old_role: Option<String>,
    pub new_role: Option<String>,
    pub removed_role: Option<String>,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            event_id: entry.event_id,
            project_id: entry.project_id.to_string(),
            subject: entry.subject,
            action: entry.action.as_str().to_owned(),
            target_user_id: entry.target_subject,
            old_role: entry.old_role.map(|role| role.as_str().to_owned()),
            new_role: entry.new_role.map(|role| role.as_str().to_owned()),
            removed_role: entry.removed_role.map(|role| role.as_str().to_owned()),
            detail: entry.detail,
            created_at: entry.created_at,
        }
    }
}
