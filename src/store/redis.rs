//! Redis-backed atomic store for distributed rate limiting.
//!
//! Uses connection pooling for high performance; admission scripts run as
//! Lua at the server, so the decision is one atomic round trip.

use std::time::Duration;

use deadpool_redis::{
    redis::{cmd, Script},
    Config, Connection, Pool, PoolConfig, Runtime,
};

use crate::error::{Result, StoreError};
use crate::store::AtomicStore;

/// Redis store configuration.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Connection pool size
    pub pool_size: usize,
    /// Key prefix for limiter keys
    pub key_prefix: String,
    /// Connection timeout
    pub connection_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            pool_size: 10,
            key_prefix: "rl:".to_string(),
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl RedisConfig {
    /// Create a new Redis configuration.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the pool size.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the connection timeout.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }
}

/// Redis store backend for the distributed limiters.
///
/// # Example
///
/// ```ignore
/// use gatelimit::store::{RedisStore, RedisConfig};
///
/// let config = RedisConfig::new("redis://localhost:6379")
///     .with_prefix("myapp:rl:")
///     .with_pool_size(20);
///
/// let store = RedisStore::new(config).await?;
/// ```
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    key_prefix: String,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl RedisStore {
    /// Create a new Redis store from configuration.
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let mut cfg = Config::from_url(&config.url);

        let mut pool_cfg = PoolConfig::new(config.pool_size);
        pool_cfg.timeouts.create = Some(config.connection_timeout);
        pool_cfg.timeouts.wait = Some(config.connection_timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        // Test connection
        let mut conn = pool
            .get()
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;
        let _: () = cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            pool,
            key_prefix: config.key_prefix,
        })
    }

    /// Create a new Redis store from a URL.
    pub async fn from_url(url: impl Into<String>) -> Result<Self> {
        Self::new(RedisConfig::new(url)).await
    }

    /// Get the full key with prefix.
    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> std::result::Result<Connection, StoreError> {
        self.pool.get().await.map_err(|_| StoreError::PoolExhausted)
    }
}

impl AtomicStore for RedisStore {
    async fn eval_admit(
        &self,
        script: &'static str,
        key: &str,
        args: &[i64],
    ) -> std::result::Result<bool, StoreError> {
        let mut conn = self.get_conn().await?;
        let full_key = self.full_key(key);

        let script = Script::new(script);
        let mut invocation = script.key(full_key);
        for arg in args {
            invocation.arg(*arg);
        }

        let limited: i64 = invocation
            .invoke_async(&mut *conn)
            .await
            .map_err(|e| StoreError::Script(e.to_string()))?;

        Ok(limited != 0)
    }
}
