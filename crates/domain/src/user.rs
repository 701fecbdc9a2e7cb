//! User-facing identity types shared by invitations and member listings.

use serde::{Deserialize, Serialize};
use taskflow_core::{AppError, AppResult};

/// Display name returned for members whose identity can no longer be resolved.
pub const UNKNOWN_MEMBER_DISPLAY_NAME: &str = "Unknown user";

/// Validated, lower-cased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether a raw, unnormalized address refers to this email.
    #[must_use]
    pub fn matches(&self, raw: &str) -> bool {
        raw.trim().eq_ignore_ascii_case(self.0.as_str())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Profile resolved from the identity provider for one user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable user id.
    pub subject: String,
    /// Primary email, if the provider holds one.
    pub email: Option<String>,
    /// Human-readable display name.
    pub display_name: String,
}
