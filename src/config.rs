use anyhow::{Context, anyhow};
use dotenvy::dotenv;
use std::{env, str::FromStr};

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,
    pub cuti_prefix: String,

    // Avatar uploads
    pub upload_dir: String,
    pub upload_max_bytes: usize,
    pub public_base_url: String,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: env_or("ACCESS_TOKEN_TTL", 900)?, // default 15 min
            refresh_token_ttl: env_or("REFRESH_TOKEN_TTL", 604_800)?, // default 7 days

            rate_login_per_min: env_or("RATE_LOGIN_PER_MIN", 60)?,
            rate_register_per_min: env_or("RATE_REGISTER_PER_MIN", 30)?,
            rate_refresh_per_min: env_or("RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: env_or("RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: env_or("API_PREFIX", "/v1".to_string())?,
            cuti_prefix: env_or("CUTI_PREFIX", "/cuti".to_string())?,

            upload_dir: env_or("UPLOAD_DIR", "public/uploads/images".to_string())?,
            upload_max_bytes: env_or("UPLOAD_MAX_BYTES", 5 * 1024 * 1024)?,
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:3000".to_string())?
                .trim_end_matches('/')
                .to_string(),

            log_dir: env_or("LOG_DIR", "logs".to_string())?,
            log_level: env_or("LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
