use agora_common::util::{NonPositiveDurationError, PositiveDuration};
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::net::{IpAddr, SocketAddr};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Invalid redis url: {0}")]
    RedisUrl(#[from] url::ParseError),
    #[error("The redis password cannot be set on {0}")]
    RedisPassword(String),
    #[error("Invalid TTL: {0}")]
    Ttl(#[from] NonPositiveDurationError),
}

/// Process configuration, read once at startup.
#[derive(Clone, Eq, PartialEq, Deserialize)]
pub struct Env {
    pub server_address: IpAddr,
    pub server_port: u16,

    pub postgres_host: String,
    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,
    pub postgres_user: String,
    pub postgres_password: String,
    pub postgres_dbname: String,
    #[serde(default = "default_postgres_max_connections")]
    pub postgres_max_connections: u32,

    pub redis_host: String,
    #[serde(default = "default_redis_port")]
    pub redis_port: u16,
    #[serde(default)]
    pub redis_password: Option<String>,
    #[serde(default)]
    pub redis_db: u32,

    #[serde(default = "default_session_ttl_seconds")]
    pub session_ttl_seconds: u64,
    #[serde(default = "default_post_cache_ttl_seconds")]
    pub post_cache_ttl_seconds: u64,
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_max_connections() -> u32 {
    10
}

fn default_redis_port() -> u16 {
    6379
}

fn default_session_ttl_seconds() -> u64 {
    24 * 60 * 60
}

fn default_post_cache_ttl_seconds() -> u64 {
    5 * 60
}

impl Env {
    #[must_use]
    pub fn server_address(&self) -> SocketAddr {
        SocketAddr::new(self.server_address, self.server_port)
    }

    #[must_use]
    pub fn postgres_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.postgres_host)
            .port(self.postgres_port)
            .username(&self.postgres_user)
            .password(&self.postgres_password)
            .database(&self.postgres_dbname)
    }

    pub fn redis_url(&self) -> Result<Url, ConfigError> {
        let mut url = Url::parse(&format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        ))?;

        if let Some(password) = self
            .redis_password
            .as_deref()
            .filter(|password| !password.is_empty())
        {
            url.set_password(Some(password))
                .map_err(|()| ConfigError::RedisPassword(self.redis_host.clone()))?;
        }

        Ok(url)
    }

    pub fn session_ttl(&self) -> Result<PositiveDuration, ConfigError> {
        Ok(PositiveDuration::from_seconds(self.session_ttl_seconds)?)
    }

    pub fn post_cache_ttl(&self) -> Result<PositiveDuration, ConfigError> {
        Ok(PositiveDuration::from_seconds(self.post_cache_ttl_seconds)?)
    }
}

pub fn get_env() -> Result<Env, ConfigError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .env file found");
        } else {
            return Err(e.into());
        }
    }

    Ok(envy::from_env()?)
}
