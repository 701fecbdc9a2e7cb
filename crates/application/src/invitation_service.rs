use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use taskflow_core::{AppError, AppResult, ProjectId, UserIdentity};
use taskflow_domain::{
    DEFAULT_INVITATION_TTL_DAYS, EmailAddress, Invitation, InvitationDraft, InvitationId,
    Permission, Project, ProjectRole,
};

use crate::authorization_service::ensure_permission;
use crate::project_writes::{StagedWrite, commit_with_retry, project_not_found};
use crate::{IdentityProvider, InvitationRepository, ProjectRepository};

mod invite;
mod listing;
mod respond;

/// Raw invite request as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteUserInput {
    /// Target project id.
    pub project_id: String,
    /// Invitee email.
    pub email: String,
    /// Role to grant.
    pub role: String,
}

/// Result of a successful invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationReceipt {
    /// Created invitation id.
    pub invitation_id: InvitationId,
    /// Human-readable confirmation.
    pub message: String,
}

/// Application service driving the invitation state machine.
#[derive(Clone)]
pub struct InvitationService {
    project_repository: Arc<dyn ProjectRepository>,
    invitation_repository: Arc<dyn InvitationRepository>,
    identity_provider: Arc<dyn IdentityProvider>,
    invitation_ttl: Duration,
}

impl InvitationService {
    /// Creates a new invitation service with the default lifetime.
    #[must_use]
    pub fn new(
        project_repository: Arc<dyn ProjectRepository>,
        invitation_repository: Arc<dyn InvitationRepository>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            project_repository,
            invitation_repository,
            identity_provider,
            invitation_ttl: Duration::days(DEFAULT_INVITATION_TTL_DAYS),
        }
    }

    /// Overrides how long new invitations stay open.
    #[must_use]
    pub fn with_invitation_ttl(mut self, invitation_ttl: Duration) -> Self {
        self.invitation_ttl = invitation_ttl;
        self
    }

    async fn load_invitation(&self, invitation_id: &str) -> AppResult<Invitation> {
        let invitation_id = InvitationId::from_str(invitation_id)?;
        self.invitation_repository
            .find_invitation(&invitation_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("invitation '{invitation_id}' does not exist"))
            })
    }
}
