//! Invitation state machine: `pending -> accepted | declined`.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use taskflow_core::{AppError, AppResult, ProjectId};

use crate::role::ProjectRole;
use crate::user::EmailAddress;

/// Default lifetime of a pending invitation.
pub const DEFAULT_INVITATION_TTL_DAYS: i64 = 7;

/// Deterministic invitation identifier.
///
/// Derived from the project, the normalized invitee email and the creation
/// instant, so two invitations issued in the same millisecond collide on
/// the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvitationId(String);

impl InvitationId {
    /// Derives the identifier for a new invitation.
    #[must_use]
    pub fn derive(
        project_id: ProjectId,
        invitee_email: &EmailAddress,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(project_id.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(invitee_email.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(created_at.timestamp_millis().to_string().as_bytes());

        let digest = hasher.finalize();
        let encoded = digest
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();

        Self(encoded)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for InvitationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl FromStr for InvitationId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("invitation id is required".to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }
}

/// Lifecycle state of an invitation. Only `Pending` is mutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Awaiting a decision from the invitee.
    Pending,
    /// Accepted by the invitee; terminal.
    Accepted,
    /// Declined by the invitee; terminal.
    Declined,
}

impl InvitationStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            _ => Err(AppError::Validation(format!(
                "unknown invitation status '{value}'"
            ))),
        }
    }
}

/// Offer for a user, identified by email, to join a project with a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invitation {
    /// Deterministic identifier.
    pub id: InvitationId,
    /// Target project.
    pub project_id: ProjectId,
    /// Project name captured at issue time.
    pub project_name: String,
    /// User id of the inviter.
    pub inviter_subject: String,
    /// Inviter email captured at issue time.
    pub inviter_email: Option<String>,
    /// Normalized invitee email.
    pub invitee_email: EmailAddress,
    /// Invitee user id when the email resolved at issue time.
    pub invitee_subject: Option<String>,
    /// Role granted on acceptance; never `owner`.
    pub role: ProjectRole,
    /// Lifecycle state.
    pub status: InvitationStatus,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Set once accepted.
    pub accepted_at: Option<DateTime<Utc>>,
    /// Set once declined.
    pub declined_at: Option<DateTime<Utc>>,
}

/// Input used to issue an invitation.
#[derive(Debug, Clone)]
pub struct InvitationDraft {
    /// Target project.
    pub project_id: ProjectId,
    /// Project name captured at issue time.
    pub project_name: String,
    /// User id of the inviter.
    pub inviter_subject: String,
    /// Inviter email, if known.
    pub inviter_email: Option<String>,
    /// Normalized invitee email.
    pub invitee_email: EmailAddress,
    /// Invitee user id when already resolvable.
    pub invitee_subject: Option<String>,
    /// Role to grant.
    pub role: ProjectRole,
}

impl Invitation {
    /// Issues a pending invitation expiring `ttl` after `now`.
    pub fn issue(draft: InvitationDraft, now: DateTime<Utc>, ttl: Duration) -> AppResult<Self> {
        if !draft.role.is_assignable() {
            return Err(AppError::Validation(
                "invitations cannot grant the owner role".to_owned(),
            ));
        }

        if ttl <= Duration::zero() {
            return Err(AppError::Validation(
                "invitation lifetime must be positive".to_owned(),
            ));
        }

        Ok(Self {
            id: InvitationId::derive(draft.project_id, &draft.invitee_email, now),
            project_id: draft.project_id,
            project_name: draft.project_name,
            inviter_subject: draft.inviter_subject,
            inviter_email: draft.inviter_email,
            invitee_email: draft.invitee_email,
            invitee_subject: draft.invitee_subject,
            role: draft.role,
            status: InvitationStatus::Pending,
            created_at: now,
            expires_at: now + ttl,
            accepted_at: None,
            declined_at: None,
        })
    }

    /// Returns whether the invitation is past its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Returns whether the invitation is pending and not expired.
    #[must_use]
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && !self.is_expired(now)
    }

    /// Returns whether the invitation targets this caller.
    ///
    /// A resolved invitee id takes precedence; otherwise the caller's email is
    /// compared case-insensitively.
    #[must_use]
    pub fn is_addressed_to(&self, subject: &str, email: Option<&str>) -> bool {
        match self.invitee_subject.as_deref() {
            Some(invitee_subject) => invitee_subject == subject,
            None => email.is_some_and(|email| self.invitee_email.matches(email)),
        }
    }

    /// Checks that the caller may accept or decline right now.
    pub fn ensure_can_respond(
        &self,
        subject: &str,
        email: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if self.status != InvitationStatus::Pending {
            return Err(AppError::Validation(format!(
                "invitation '{}' is already {}",
                self.id,
                self.status.as_str()
            )));
        }

        if self.is_expired(now) {
            return Err(AppError::DeadlineExceeded(format!(
                "invitation '{}' has expired",
                self.id
            )));
        }

        if !self.is_addressed_to(subject, email) {
            return Err(AppError::Forbidden(format!(
                "invitation '{}' is addressed to another user",
                self.id
            )));
        }

        Ok(())
    }

    /// Moves the invitation to `accepted`.
    pub fn accept(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_pending()?;
        self.status = InvitationStatus::Accepted;
        self.accepted_at = Some(now);
        Ok(())
    }

    /// Moves the invitation to `declined`.
    pub fn decline(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure_pending()?;
        self.status = InvitationStatus::Declined;
        self.declined_at = Some(now);
        Ok(())
    }

    fn ensure_pending(&self) -> AppResult<()> {
        if self.status == InvitationStatus::Pending {
            return Ok(());
        }

        Err(AppError::Validation(format!(
            "invitation '{}' is already {}",
            self.id,
            self.status.as_str()
        )))
    }
}
