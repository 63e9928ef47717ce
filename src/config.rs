use anyhow::Context;
use serde::Deserialize;

use crate::auth::password::PasswordScheme;

/// Token lifetime: one month, 2,629,746 seconds.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 2_629_746;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
/// Cost range bcrypt accepts.
pub const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub scheme: PasswordScheme,
    pub bcrypt_cost: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            scheme: PasswordScheme::Bcrypt,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            BCRYPT_COST_RANGE.contains(&self.bcrypt_cost),
            "bcrypt cost {} outside {}..={}",
            self.bcrypt_cost,
            BCRYPT_COST_RANGE.start(),
            BCRYPT_COST_RANGE.end()
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// `None` runs the service on the in-memory store.
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(DatabaseConfig {
                url,
                max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
                acquire_timeout_secs: env_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5),
            }),
            _ => None,
        };

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_seconds: env_or("JWT_TTL_SECONDS", DEFAULT_TOKEN_TTL_SECONDS),
        };

        let scheme = match std::env::var("PASSWORD_SCHEME") {
            Ok(v) => v.parse::<PasswordScheme>()?,
            Err(_) => PasswordScheme::Bcrypt,
        };
        let password = PasswordConfig {
            scheme,
            bcrypt_cost: env_or("BCRYPT_COST", DEFAULT_BCRYPT_COST),
        };
        password.validate().context("invalid BCRYPT_COST")?;

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("APP_PORT", 3000),
            database,
            jwt,
            password,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
