use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use taskflow_application::InviteUserInput;
use taskflow_core::UserIdentity;

use crate::dto::{
    AcceptInvitationResponse, InvitationResponse, InviteUserRequest, InviteUserResponse,
    SuccessResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn invite_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
    Json(payload): Json<InviteUserRequest>,
) -> ApiResult<(StatusCode, Json<InviteUserResponse>)> {
    let receipt = state
        .invitation_service
        .invite_user(
            &user,
            InviteUserInput {
                project_id,
                email: payload.email,
                role: payload.role,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(InviteUserResponse::from(receipt))))
}

pub async fn accept_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invitation_id): Path<String>,
) -> ApiResult<Json<AcceptInvitationResponse>> {
    let project_id = state
        .invitation_service
        .accept_invitation(&user, invitation_id.as_str())
        .await?;

    Ok(Json(AcceptInvitationResponse {
        success: true,
        project_id: project_id.to_string(),
    }))
}

pub async fn decline_invitation_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invitation_id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    state
        .invitation_service
        .decline_invitation(&user, invitation_id.as_str())
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

pub async fn list_my_invitations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<InvitationResponse>>> {
    let invitations = state
        .invitation_service
        .list_my_invitations(&user)
        .await?
        .into_iter()
        .map(InvitationResponse::from)
        .collect();

    Ok(Json(invitations))
}
