use serde::{Deserialize, Serialize};
use taskflow_application::InvitationReceipt;
use taskflow_domain::Invitation;
use ts_rs::TS;

/// Incoming payload for inviting a user by email.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invite-user-request.ts"
)]
pub struct InviteUserRequest {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invite-user-response.ts"
)]
pub struct InviteUserResponse {
    pub success: bool,
    pub invitation_id: String,
    pub message: String,
}

impl From<InvitationReceipt> for InviteUserResponse {
    fn from(receipt: InvitationReceipt) -> Self {
        Self {
            success: true,
            invitation_id: receipt.invitation_id.as_str().to_owned(),
            message: receipt.message,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/accept-invitation-response.ts"
)]
pub struct AcceptInvitationResponse {
    pub success: bool,
    pub project_id: String,
}

/// Pending invitation addressed to the caller.
#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/invitation-response.ts"
)]
pub struct InvitationResponse {
    pub id: String,
    pub project_id: String,
    pub project_name: String,
    pub inviter_subject: String,
    pub inviter_email: Option<String>,
    pub invitee_email: String,
    pub role: String,
    pub status: String,
    pub created_at: String,
    pub expires_at: String,
}

impl From<Invitation> for InvitationResponse {
    fn from(invitation: Invitation) -> Self {
        Self {
            id: invitation.id.as_str().to_owned(),
            project_id: invitation.project_id.to_string(),
            project_name: invitation.project_name,
            inviter_subject: invitation.inviter_subject,
            inviter_email: invitation.inviter_email,
            invitee_email: invitation.invitee_email.into(),
            role: invitation.role.as_str().to_owned(),
            status: invitation.status.as_str().to_owned(),
            created_at: invitation.created_at.to_rfc3339(),
            expires_at: invitation.expires_at.to_rfc3339(),
        }
    }
}
