use axum::Router;
use axum::middleware::from_fn;
use axum::routing::{delete, get, post, put};
use taskflow_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/projects",
            get(handlers::projects::list_projects_handler)
                .post(handlers::projects::create_project_handler),
        )
        .route(
            "/api/projects/{project_id}",
            get(handlers::projects::get_project_handler),
        )
        .route(
            "/api/projects/{project_id}/permissions",
            get(handlers::projects::project_permissions_handler),
        )
        .route(
            "/api/projects/{project_id}/invitations",
            post(handlers::invitations::invite_user_handler),
        )
        .route(
            "/api/projects/{project_id}/members/lookup",
            post(handlers::members::lookup_members_handler),
        )
        .route(
            "/api/projects/{project_id}/members/{member_user_id}",
            delete(handlers::members::remove_member_handler),
        )
        .route(
            "/api/projects/{project_id}/members/{member_user_id}/role",
            put(handlers::members::change_member_role_handler),
        )
        .route(
            "/api/projects/{project_id}/audit-log",
            get(handlers::members::list_audit_log_handler),
        )
        .route(
            "/api/invitations",
            get(handlers::invitations::list_my_invitations_handler),
        )
        .route(
            "/api/invitations/{invitation_id}/accept",
            post(handlers::invitations::accept_invitation_handler),
        )
        .route(
            "/api/invitations/{invitation_id}/decline",
            post(handlers::invitations::decline_invitation_handler),
        )
        .route(
            "/api/migrations",
            get(handlers::migrations::list_migrations_handler)
                .post(handlers::migrations::migrate_projects_handler),
        )
        .route(
            "/api/migrations/needed",
            get(handlers::migrations::migration_needed_handler),
        )
        .route(
            "/api/migrations/{migration_id}",
            get(handlers::migrations::get_migration_handler),
        )
        .route("/auth/me", get(auth::me_handler))
        .route_layer(from_fn(middleware::require_auth));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .layer(session_layer)
        .with_state(app_state))
}
