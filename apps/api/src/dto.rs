mod common;
mod invitations;
mod members;
mod migrations;
mod projects;

pub use common::{HealthResponse, SuccessResponse, UserIdentityResponse};
pub use invitations::{
    AcceptInvitationResponse, InvitationResponse, InviteUserRequest, InviteUserResponse,
};
pub use members::{
    AuditLogEntryResponse, AuditLogQueryParams, ChangeMemberRoleRequest,
    MembershipMessageResponse, ProjectMemberResponse, ProjectMembersRequest,
};
pub use migrations::{
    DryRunPlanResponse, FailedProjectResponse, InconsistencyResponse, InvalidProjectResponse,
    MigratedProjectResponse, MigrateProjectsRequest, MigrationLogResponse, MigrationNeedResponse,
    MigrationReportResponse, MigrationResultsResponse, MigrationRunResponse,
    ProjectProgressResponse, ProjectWarningResponse, ValidProjectResponse,
    ValidationReportResponse,
};
pub use projects::{CreateProjectRequest, ProjectPermissionsResponse, ProjectResponse};
