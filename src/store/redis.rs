//! Redis-backed shared store.
//!
//! # Responsibilities
//! - Lazily connect and keep a reconnecting connection manager
//! - Run INCR + EXPIRE inside one MULTI/EXEC pipeline
//! - Bound every round-trip with the configured operation timeout

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError};
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::config::StoreConfig;
use crate::store::{SharedStore, StoreError, StoreResult};

impl From<RedisError> for StoreError {
    fn from(e: RedisError) -> Self {
        if e.kind() == redis::ErrorKind::TypeError {
            StoreError::WrongType(e.to_string())
        } else {
            StoreError::Unavailable(e.to_string())
        }
    }
}

/// Shared store backed by a Redis server.
pub struct RedisStore {
    client: redis::Client,
    url: String,
    connection: OnceCell<ConnectionManager>,
    op_timeout: Duration,
}

impl RedisStore {
    /// Create a store for the configured server. No connection is made yet.
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let url = format!("redis://{}:{}/", config.redis_host, config.redis_port);
        let client = redis::Client::open(url.as_str())
            .map_err(|e| StoreError::Unavailable(format!("invalid redis url '{}': {}", url, e)))?;

        Ok(Self {
            client,
            url,
            connection: OnceCell::new(),
            op_timeout: Duration::from_millis(config.op_timeout_ms),
        })
    }

    /// Connection URL, for logging.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn connection(&self) -> StoreResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = self.client.get_connection_manager().await?;
                tracing::info!(url = %self.url, "Connected to Redis");
                Ok::<_, RedisError>(manager)
            })
            .await
            .map_err(|e| {
                tracing::error!(url = %self.url, error = %e, "Redis connection failed");
                StoreError::from(e)
            })?;
        Ok(manager.clone())
    }

    /// Run `op` on a live connection under the operation timeout.
    async fn bounded<T, F, Fut>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = Result<T, RedisError>>,
    {
        let work = async {
            let conn = self.connection().await?;
            op(conn).await.map_err(StoreError::from)
        };
        match timeout(self.op_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(url = %self.url, timeout_ms = self.op_timeout.as_millis() as u64, "Redis operation timed out");
                Err(StoreError::Unavailable(format!(
                    "redis operation timed out after {}ms",
                    self.op_timeout.as_millis()
                )))
            }
        }
    }
}

/// Redis rejects an EXPIRE of zero seconds as a delete, so round up.
fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

/// EXPIRE takes a signed count; clamp instead of wrapping negative.
fn expire_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl_secs(ttl)).unwrap_or(i64::MAX)
}

#[async_trait]
impl SharedStore for RedisStore {
    async fn increment_and_expire(&self, key: &str, ttl: Duration) -> StoreResult<u64> {
        let secs = expire_secs(ttl);
        self.bounded(|mut conn| async move {
            let (count,): (u64,) = redis::pipe()
                .atomic()
                .incr(key, 1)
                .expire(key, secs)
                .ignore()
                .query_async(&mut conn)
                .await?;
            Ok(count)
        })
        .await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.bounded(|mut conn| async move { conn.get(key).await }).await
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> StoreResult<()> {
        let secs = ttl_secs(ttl);
        self.bounded(|mut conn| async move { conn.set_ex(key, value, secs).await }).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.bounded(|mut conn| async move {
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok(())
        })
        .await
    }
}
