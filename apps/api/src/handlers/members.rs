use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use taskflow_core::{ProjectId, UserIdentity};

use crate::dto::{
    AuditLogEntryResponse, AuditLogQueryParams, ChangeMemberRoleRequest,
    MembershipMessageResponse, ProjectMemberResponse, ProjectMembersRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn lookup_members_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Json(payload): Json<ProjectMembersRequest>,
) -> ApiResult<Json<Vec<ProjectMemberResponse>>> {
    let project_id = ProjectId::from_str(project_id.as_str())?;
    let members = state
        .membership_service
        .list_project_members(&user, project_id, payload.member_ids)
        .await?
        .into_iter()
        .map(ProjectMemberResponse::from)
        .collect();

    Ok(Json(members))
}

pub async fn change_member_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, target_user_id)): Path<(String, String)>,
    Json(payload): Json<ChangeMemberRoleRequest>,
) -> ApiResult<Json<MembershipMessageResponse>> {
    let change = state
        .membership_service
        .change_member_role(
            &user,
            project_id.as_str(),
            target_user_id.as_str(),
            payload.new_role.as_str(),
        )
        .await?;

    Ok(Json(MembershipMessageResponse::new(change.message)))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((project_id, member_user_id)): Path<(String, String)>,
) -> ApiResult<Json<MembershipMessageResponse>> {
    let message = state
        .membership_service
        .remove_member(&user, project_id.as_str(), member_user_id.as_str())
        .await?;

    Ok(Json(MembershipMessageResponse::new(message)))
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Query(params): Query<AuditLogQueryParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let project_id = ProjectId::from_str(project_id.as_str())?;
    let entries = state
        .membership_service
        .list_project_audit_log(&user, project_id, params.into())
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
