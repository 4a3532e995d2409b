//! Ephemeral key-value cache.
//!
//! Holds sessions, post detail snapshots and like sets:
//!
//! ```text
//! session:{token}        → Identity JSON (absolute TTL)
//! post:{id}              → PostDetail JSON (short TTL)
//! post:likes:{id}        → set of user ids (no TTL)
//! comment:likes:{id}     → set of user ids (no TTL)
//! ```
//!
//! Each call is atomic on its own. Callers that combine calls get no
//! atomicity across them.

use agora_common::util::PositiveDuration;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, IntoConnectionInfo, RedisError, aio::ConnectionManager};
use thiserror::Error;
use tracing::info;

pub type Result<T, E = CacheError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Redis(#[from] RedisError),
    #[error("Key {0} holds a value of the wrong type")]
    WrongType(String),
}

impl CacheError {
    /// Maps a redis `WRONGTYPE` reply to [`CacheError::WrongType`] so every
    /// backend reports a type mismatch the same way.
    fn from_redis(key: &str, err: RedisError) -> Self {
        if err.code() == Some("WRONGTYPE") {
            CacheError::WrongType(key.to_owned())
        } else {
            CacheError::Redis(err)
        }
    }
}

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value and expiring
    /// it after `ttl`.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: PositiveDuration) -> Result<()>;

    async fn is_member(&self, key: &str, member: &str) -> Result<bool>;

    async fn add_member(&self, key: &str, member: &str) -> Result<()>;

    async fn remove_member(&self, key: &str, member: &str) -> Result<()>;

    /// Number of members in the set, zero if the key does not exist.
    async fn cardinality(&self, key: &str) -> Result<u64>;
}

/// Redis-backed [`Cache`].
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    #[must_use]
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub async fn connect(info: impl IntoConnectionInfo) -> Result<Self> {
        let client = Client::open(info)?;
        let connection = client.get_connection_manager().await?;
        info!("Connected to redis");

        Ok(Self::new(connection))
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        let value: Option<String> = connection
            .get(key)
            .await
            .map_err(|err| CacheError::from_redis(key, err))?;
        Ok(value)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: PositiveDuration) -> Result<()> {
        let mut connection = self.connection.clone();
        let () = connection
            .set_ex(key, value, ttl.whole_seconds_ceil())
            .await
            .map_err(|err| CacheError::from_redis(key, err))?;
        Ok(())
    }

    async fn is_member(&self, key: &str, member: &str) -> Result<bool> {
        let mut connection = self.connection.clone();
        let is_member: bool = connection
            .sismember(key, member)
            .await
            .map_err(|err| CacheError::from_redis(key, err))?;
        Ok(is_member)
    }

    async fn add_member(&self, key: &str, member: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        let _added: u64 = connection
            .sadd(key, member)
            .await
            .map_err(|err| CacheError::from_redis(key, err))?;
        Ok(())
    }

    async fn remove_member(&self, key: &str, member: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        let _removed: u64 = connection
            .srem(key, member)
            .await
            .map_err(|err| CacheError::from_redis(key, err))?;
        Ok(())
    }

    async fn cardinality(&self, key: &str) -> Result<u64> {
        let mut connection = self.connection.clone();
        let count: u64 = connection
            .scard(key)
            .await
            .map_err(|err| CacheError::from_redis(key, err))?;
        Ok(count)
    }
}
