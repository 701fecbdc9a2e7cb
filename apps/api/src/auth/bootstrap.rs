use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use taskflow_core::{AppError, UserIdentity};
use taskflow_domain::UserProfile;
use tower_sessions::Session;
use tracing::info;

use crate::dto::UserIdentityResponse;
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapRequest {
    pub subject: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub token: String,
}

/// Development sign-in guarded by the shared bootstrap token.
///
/// Registers the caller in the user directory so invitations can resolve them.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    if payload.token != state.bootstrap_token.as_ref() {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let subject = payload.subject.trim().to_owned();
    if subject.is_empty() {
        return Err(AppError::Validation("subject must not be empty".to_owned()).into());
    }

    let display_name = payload
        .display_name
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| subject.clone());
    let email = payload
        .email
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty());

    state
        .identity_provider
        .upsert_user(UserProfile {
            subject: subject.clone(),
            email: email.clone(),
            display_name: display_name.clone(),
        })
        .await?;

    let identity = UserIdentity::new(subject, display_name, email);

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;
    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    info!(subject = identity.subject(), "bootstrap session established");
    Ok(Json(UserIdentityResponse::from(identity)))
}
