mod conversions;
mod types;

pub use types::{
    DryRunPlanResponse, FailedProjectResponse, InconsistencyResponse, InvalidProjectResponse,
    MigratedProjectResponse, MigrateProjectsRequest, MigrationLogResponse, MigrationNeedResponse,
    MigrationReportResponse, MigrationResultsResponse, MigrationRunResponse,
    ProjectProgressResponse, ProjectWarningResponse, ValidProjectResponse,
    ValidationReportResponse,
};
