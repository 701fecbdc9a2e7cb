use async_trait::async_trait;

use taskflow_core::AppResult;
use taskflow_domain::{EmailAddress, UserProfile};

/// Identity provider collaborator resolving user ids and emails.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolves the user id registered for an email.
    async fn resolve_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>>;

    /// Resolves the profile for a user id.
    async fn resolve_user_by_id(&self, subject: &str) -> AppResult<Option<UserProfile>>;

    /// Registers or refreshes a user profile.
    async fn upsert_user(&self, profile: UserProfile) -> AppResult<()>;
}
