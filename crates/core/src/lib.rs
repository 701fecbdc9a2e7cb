//! Shared primitives for all Rust crates in TaskFlow.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use auth::UserIdentity;

/// Result type used across TaskFlow crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Project identifier; the project document is the unit of mutual exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(Uuid);

impl ProjectId {
    /// Creates a random project identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a project identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ProjectId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("project id is required".to_owned()));
        }

        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid project id '{value}': {error}")))
    }
}

/// Common application error categories.
///
/// Each variant maps to one stable caller-visible code (see [`AppError::code`]).
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A time-bound resource is past its deadline.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// The target is not in a state that allows the operation.
    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the stable code clients branch on.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid-argument",
            Self::NotFound(_) => "not-found",
            Self::Conflict(_) => "already-exists",
            Self::Unauthorized(_) => "unauthenticated",
            Self::Forbidden(_) => "permission-denied",
            Self::DeadlineExceeded(_) => "deadline-exceeded",
            Self::FailedPrecondition(_) => "failed-precondition",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AppError, NonEmptyString, ProjectId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn project_id_formats_as_uuid() {
        let project_id = ProjectId::new();
        assert_eq!(project_id.to_string().len(), 36);
    }

    #[test]
    fn project_id_parses_its_own_display_value() {
        let project_id = ProjectId::new();
        let parsed = ProjectId::from_str(project_id.to_string().as_str());
        assert!(matches!(parsed, Ok(value) if value == project_id));
    }

    #[test]
    fn blank_project_id_is_a_validation_error() {
        assert!(matches!(
            ProjectId::from_str("  "),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AppError::Conflict(String::new()).code(), "already-exists");
        assert_eq!(
            AppError::DeadlineExceeded(String::new()).code(),
            "deadline-exceeded"
        );
        assert_eq!(AppError::Forbidden(String::new()).code(), "permission-denied");
    }
}
