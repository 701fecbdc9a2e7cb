use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use taskflow_application::{CreateProjectInput, ProjectAccessView};
use taskflow_core::{AppError, ProjectId, UserIdentity};
use taskflow_domain::MemberAccess;

use crate::dto::{CreateProjectRequest, ProjectPermissionsResponse, ProjectResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_project_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    let project = state
        .project_service
        .create_project(
            &user,
            CreateProjectInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;
    let access = project.access_of(user.subject());

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::from(ProjectAccessView { project, access })),
    ))
}

pub async fn list_projects_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let projects = state
        .project_service
        .list_my_projects(&user)
        .await?
        .into_iter()
        .map(ProjectResponse::from)
        .collect();

    Ok(Json(projects))
}

pub async fn get_project_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let project_id = ProjectId::from_str(project_id.as_str())?;
    let view = state.project_service.get_project(&user, project_id).await?;

    Ok(Json(ProjectResponse::from(view)))
}

pub async fn project_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(project_id): Path<String>,
) -> ApiResult<Json<ProjectPermissionsResponse>> {
    let project_id = ProjectId::from_str(project_id.as_str())?;
    let role = state
        .authorization_service
        .project_role(&user, project_id)
        .await?;

    if role.is_none() {
        let view = state.project_service.get_project(&user, project_id).await?;
        if view.access != MemberAccess::MigrationRequired {
            return Err(AppError::Forbidden(format!(
                "subject '{}' has no role in project '{project_id}'",
                user.subject()
            ))
            .into());
        }
    }

    Ok(Json(ProjectPermissionsResponse::new(
        project_id.to_string(),
        role,
    )))
}
