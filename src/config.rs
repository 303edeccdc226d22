use anyhow::Context;
use serde::Deserialize;

/// Deployment placeholder some hosting templates leave in DATABASE_URL.
/// Treated the same as an unset variable.
const PLACEHOLDER_DATABASE_URL: &str = "your-render-postgresql-url";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub remember_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// None when DATABASE_URL is unset, empty, or still the placeholder.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty() && url != PLACEHOLDER_DATABASE_URL);
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "hqube".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "hqube-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            remember_ttl_minutes: std::env::var("JWT_REMEMBER_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24 * 14),
        };
        Ok(Self { database_url, jwt })
    }
}
