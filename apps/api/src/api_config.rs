use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::Duration;
use taskflow_core::AppError;
use taskflow_domain::{DEFAULT_INVITATION_TTL_DAYS, RoleGrantPolicy};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub bootstrap_token: String,
    pub _session_secret: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub role_grant_policy: RoleGrantPolicy,
    pub invitation_ttl: Duration,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let bootstrap_token = required_env("AUTH_BOOTSTRAP_TOKEN")?;
        let session_secret = required_env("SESSION_SECRET")?;
        if session_secret.len() < 32 {
            return Err(AppError::Validation(
                "SESSION_SECRET must be at least 32 characters".to_owned(),
            ));
        }

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let role_grant_policy = env::var("ROLE_GRANT_POLICY")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| RoleGrantPolicy::parse(value.as_str()))
            .transpose()?
            .unwrap_or_default();

        let invitation_ttl = Duration::days(parse_invitation_ttl_days(
            env::var("INVITATION_TTL_DAYS").ok().as_deref(),
        )?);

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            bootstrap_token,
            _session_secret: session_secret,
            api_host,
            api_port,
            cookie_secure,
            role_grant_policy,
            invitation_ttl,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn parse_invitation_ttl_days(value: Option<&str>) -> Result<i64, AppError> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(DEFAULT_INVITATION_TTL_DAYS);
    };

    match value.parse::<i64>() {
        Ok(days) if (1..=365).contains(&days) => Ok(days),
        _ => Err(AppError::Validation(format!(
            "INVITATION_TTL_DAYS must be a whole number between 1 and 365, got '{value}'"
        ))),
    }
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}

#[cfg(test)]
mod tests {
    use taskflow_core::AppError;
    use taskflow_domain::DEFAULT_INVITATION_TTL_DAYS;

    use super::parse_invitation_ttl_days;

    #[test]
    fn invitation_ttl_defaults_when_unset_or_blank() {
        assert!(matches!(
            parse_invitation_ttl_days(None),
            Ok(days) if days == DEFAULT_INVITATION_TTL_DAYS
        ));
        assert!(matches!(
            parse_invitation_ttl_days(Some("  ")),
            Ok(days) if days == DEFAULT_INVITATION_TTL_DAYS
        ));
    }

    #[test]
    fn invitation_ttl_rejects_out_of_range_values() {
        assert!(matches!(parse_invitation_ttl_days(Some("14")), Ok(14)));
        assert!(matches!(
            parse_invitation_ttl_days(Some("0")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_invitation_ttl_days(Some("seven")),
            Err(AppError::Validation(_))
        ));
    }
}
