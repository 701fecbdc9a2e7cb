use axum::Json;
use axum::extract::{Extension, Path, State};
use taskflow_application::MigrateProjectsInput;
use taskflow_core::{AppError, UserIdentity};
use uuid::Uuid;

use crate::dto::{
    MigrateProjectsRequest, MigrationLogResponse, MigrationNeedResponse, MigrationReportResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn migrate_projects_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<MigrateProjectsRequest>,
) -> ApiResult<Json<MigrationReportResponse>> {
    let input = MigrateProjectsInput::try_from(payload)?;
    let report = state
        .migration_service
        .migrate_my_projects(&user, input)
        .await?;

    Ok(Json(MigrationReportResponse::from(report)))
}

pub async fn list_migrations_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<MigrationLogResponse>>> {
    let logs = state
        .migration_service
        .list_my_migration_logs(&user)
        .await?
        .into_iter()
        .map(MigrationLogResponse::from)
        .collect();

    Ok(Json(logs))
}

pub async fn get_migration_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(migration_id): Path<String>,
) -> ApiResult<Json<MigrationLogResponse>> {
    let migration_id = Uuid::parse_str(migration_id.trim())
        .map_err(|error| AppError::Validation(format!("invalid migration id: {error}")))?;
    let log = state
        .migration_service
        .get_migration_log(&user, migration_id)
        .await?;

    Ok(Json(MigrationLogResponse::from(log)))
}

pub async fn migration_needed_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<MigrationNeedResponse>> {
    let need = state.migration_service.check_migration_needed(&user).await?;

    Ok(Json(MigrationNeedResponse::from(need)))
}
