use std::sync::Arc;

use taskflow_application::{
    AuthorizationService, IdentityProvider, InvitationService, MembershipService,
    MigrationService, ProjectService,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub project_service: ProjectService,
    pub authorization_service: AuthorizationService,
    pub invitation_service: InvitationService,
    pub membership_service: MembershipService,
    pub migration_service: MigrationService,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub bootstrap_token: Arc<str>,
}
