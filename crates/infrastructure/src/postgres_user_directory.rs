use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use taskflow_application::IdentityProvider;
use taskflow_core::{AppError, AppResult};
use taskflow_domain::{EmailAddress, UserProfile};

/// PostgreSQL-backed user directory used as the identity provider.
///
/// Profiles are upserted whenever a user signs in.
#[derive(Clone)]
pub struct PostgresUserDirectory {
    pool: PgPool,
}

impl PostgresUserDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct UserProfileRow {
    subject: String,
    email: Option<String>,
    display_name: String,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        Self {
            subject: row.subject,
            email: row.email,
            display_name: row.display_name,
        }
    }
}

#[async_trait]
impl IdentityProvider for PostgresUserDirectory {
    async fn resolve_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT subject
            FROM user_directory
            WHERE lower(email) = $1
            LIMIT 1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to resolve user by email '{}': {error}",
                email.as_str()
            ))
        })
    }

    async fn resolve_user_by_id(&self, subject: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, UserProfileRow>(
            r#"
            SELECT subject, email, display_name
            FROM user_directory
            WHERE subject = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve user '{subject}': {error}"))
        })?;

        Ok(row.map(UserProfile::from))
    }

    async fn upsert_user(&self, profile: UserProfile) -> AppResult<()> {
        let email = profile
            .email
            .as_deref()
            .map(EmailAddress::new)
            .transpose()?
            .map(String::from);

        let result = sqlx::query(
            r#"
            INSERT INTO user_directory (subject, email, display_name, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (subject) DO UPDATE
            SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                updated_at = now()
            "#,
        )
        .bind(profile.subject.as_str())
        .bind(email.as_deref())
        .bind(profile.display_name.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(database_error))
                if database_error.code().as_deref() == Some("23505") =>
            {
                Err(AppError::Conflict(format!(
                    "email for user '{}' is already registered to another user",
                    profile.subject
                )))
            }
            Err(error) => Err(AppError::Internal(format!(
                "failed to upsert user '{}': {error}",
                profile.subject
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use sqlx::migrate::Migrator;
    use sqlx::postgres::PgPoolOptions;
    use taskflow_application::IdentityProvider;
    use taskflow_core::AppError;
    use taskflow_domain::{EmailAddress, UserProfile};

    use super::PostgresUserDirectory;

    static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            return None;
        };

        let pool = match PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url.as_str())
            .await
        {
            Ok(pool) => pool,
            Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
        };

        if let Err(error) = MIGRATOR.run(&pool).await {
            panic!("failed to run migrations for user directory tests: {error}");
        }

        Some(pool)
    }

    fn profile(subject: &str, email: &str) -> UserProfile {
        UserProfile {
            subject: subject.to_owned(),
            email: Some(email.to_owned()),
            display_name: subject.to_uppercase(),
        }
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive_and_upsert_refreshes() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let directory = PostgresUserDirectory::new(pool);
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let subject = format!("user-{suffix}");
        let email = format!("Person.{suffix}@Example.com");

        assert!(
            directory
                .upsert_user(profile(subject.as_str(), email.as_str()))
                .await
                .is_ok()
        );
        let lookup = EmailAddress::new(email.as_str()).unwrap_or_else(|_| unreachable!());
        let resolved = directory.resolve_user_by_email(&lookup).await;
        assert!(matches!(resolved, Ok(Some(ref found)) if found == &subject));

        let mut renamed = profile(subject.as_str(), email.as_str());
        renamed.display_name = "Renamed".to_owned();
        assert!(directory.upsert_user(renamed).await.is_ok());
        let stored = directory.resolve_user_by_id(subject.as_str()).await;
        assert!(matches!(
            stored,
            Ok(Some(ref profile)) if profile.display_name == "Renamed"
        ));
    }

    #[tokio::test]
    async fn email_owned_by_another_user_conflicts() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let directory = PostgresUserDirectory::new(pool);
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let email = format!("shared.{suffix}@example.com");

        assert!(
            directory
                .upsert_user(profile(format!("a-{suffix}").as_str(), email.as_str()))
                .await
                .is_ok()
        );
        let second = directory
            .upsert_user(profile(format!("b-{suffix}").as_str(), email.as_str()))
            .await;
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }
}
