use axum::Json;
use axum::extract::Extension;
use axum::http::StatusCode;
use taskflow_core::{AppError, UserIdentity};
use tower_sessions::Session;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    Extension(user): Extension<UserIdentity>,
) -> Json<UserIdentityResponse> {
    Json(UserIdentityResponse::from(user))
}
