use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::service::clock::AttendanceClock;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_ingest_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Shared key terminals send as `X-Terminal-Key`; ingestion is open when unset
    pub terminal_api_key: Option<String>,
    pub attendance_clock: AttendanceClock,
    pub employee_cache_ttl: Duration,

    pub run_migrations: bool,
    pub seed_demo_data: bool,
    pub seed_owner_password: String,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid {key} `{raw}`: {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", "10")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: parsed("ACCESS_TOKEN_TTL", "900")?, // default 15 min

            rate_login_per_min: parsed("RATE_LOGIN_PER_MIN", "60")?,
            rate_ingest_per_min: parsed("RATE_INGEST_PER_MIN", "600")?,
            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", "1000")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            terminal_api_key: env::var("TERMINAL_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            attendance_clock: parsed("ATTENDANCE_TIMEZONE", "local")?,
            employee_cache_ttl: Duration::from_secs(parsed("EMPLOYEE_CACHE_TTL", "300")?),

            run_migrations: parsed("RUN_MIGRATIONS", "true")?,
            seed_demo_data: parsed("SEED_DEMO_DATA", "false")?,
            seed_owner_password: env::var("SEED_OWNER_PASSWORD")
                .unwrap_or_else(|_| "change-me".to_string()),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: parsed("LOG_LEVEL", "debug")?,
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            database_url: "mysql://localhost/attendance_test".into(),
            db_max_connections: 1,
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 900,
            rate_login_per_min: 60,
            rate_ingest_per_min: 600,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            terminal_api_key: None,
            attendance_clock: AttendanceClock::Local,
            employee_cache_ttl: Duration::from_secs(60),
            run_migrations: false,
            seed_demo_data: false,
            seed_owner_password: "change-me".into(),
            log_dir: "logs".into(),
            log_level: tracing::Level::DEBUG,
        }
    }
}
