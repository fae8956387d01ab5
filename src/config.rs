use anyhow::Context;
use serde::Deserialize;

/// Upper bound for `SESSION_TTL_MINUTES` (one year).
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub secure_cookie: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    pub host: String,
    pub port: u16,
    /// When set, `/api/updateUser` only accepts payloads for the session's own email.
    pub update_requires_session: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL is not set")?;
        let session = SessionConfig {
            secret: lookup("SESSION_SECRET").context("SESSION_SECRET is not set")?,
            issuer: lookup("SESSION_ISSUER").unwrap_or_else(|| "cineswipe".into()),
            ttl_minutes: match lookup("SESSION_TTL_MINUTES") {
                Some(v) => parse_ttl_minutes(&v)?,
                None => 60 * 24,
            },
            cookie_name: lookup("SESSION_COOKIE").unwrap_or_else(|| "cineswipe.sid".into()),
            secure_cookie: lookup("SESSION_COOKIE_SECURE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        };

        if session.secret.is_empty() {
            anyhow::bail!("SESSION_SECRET must not be empty");
        }

        let port = match lookup("PORT") {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("invalid PORT value {v:?}"))?,
            None => 3000,
        };

        Ok(Self {
            database_url,
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            session,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            update_requires_session: lookup("UPDATE_REQUIRES_SESSION")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        })
    }
}

fn parse_ttl_minutes(value: &str) -> anyhow::Result<i64> {
    let minutes = value
        .trim()
        .parse::<i64>()
        .with_context(|| format!("invalid SESSION_TTL_MINUTES value {value:?}"))?;
    if !(0..=MAX_SESSION_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!(
            "SESSION_TTL_MINUTES must be between 0 and {MAX_SESSION_TTL_MINUTES}, got {minutes}"
        );
    }
    Ok(minutes)
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
