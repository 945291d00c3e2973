//! Read-through result cache.
//!
//! Values are stored as JSON in the shared store so every instance sees the
//! same entries. There is no single-flight: concurrent misses on one key each
//! run `compute` and the last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;
use crate::store::{SharedStore, StoreError};

/// Errors raised by the cache itself, as opposed to the compute function.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode cache value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Cache of computed results keyed by a query fingerprint.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn SharedStore>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn SharedStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// A failing `compute` stores nothing. A stored value that no longer
    /// decodes as `T` is treated as a miss and overwritten.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
        ttl: Option<Duration>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let cached = self.store.get(key).await.map_err(CacheError::from)?;

        if let Some(raw) = cached {
            match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    tracing::debug!(key, "Cache hit");
                    metrics::record_cache_lookup("hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                }
            }
        }

        tracing::debug!(key, "Cache miss");
        metrics::record_cache_lookup("miss");

        let value = compute().await?;
        let encoded = serde_json::to_string(&value).map_err(CacheError::from)?;
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.store
            .set_with_ttl(key, &encoded, ttl)
            .await
            .map_err(CacheError::from)?;

        Ok(value)
    }
}
