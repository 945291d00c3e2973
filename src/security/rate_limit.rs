//! Fixed-window rate limiting backed by the shared store.
//!
//! Each client gets one counter per aligned wall-clock window, keyed
//! `rate_limit:{client}:{window_index}`. Counts reset sharply at window
//! boundaries, so up to twice the threshold can pass across an edge.

use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::identity::ClientId;
use crate::store::{SharedStore, StoreResult};

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    /// Seconds until the next window starts; 0 when allowed.
    pub retry_after_secs: u64,
}

impl Decision {
    fn allow() -> Self {
        Self {
            allowed: true,
            retry_after_secs: 0,
        }
    }
}

/// Admission control shared by all request handlers.
pub struct RateLimiter {
    store: Arc<dyn SharedStore>,
    clock: Arc<dyn Clock>,
    enabled: bool,
    threshold: u64,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig, store: Arc<dyn SharedStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            enabled: config.enabled,
            threshold: config.threshold,
            window_secs: config.window_secs.max(1),
        }
    }

    /// Store key for a client's counter in a given window.
    pub fn window_key(client: &ClientId, window_index: u64) -> String {
        format!("rate_limit:{}:{}", client, window_index)
    }

    /// Count this request against the client's current window.
    pub async fn check(&self, client: &ClientId) -> StoreResult<Decision> {
        if !self.enabled {
            return Ok(Decision::allow());
        }

        let now = self.clock.now().as_secs();
        let window_index = now / self.window_secs;
        let key = Self::window_key(client, window_index);

        let count = self
            .store
            .increment_and_expire(&key, Duration::from_secs(self.window_secs))
            .await
            .inspect_err(|e| {
                tracing::error!(client = %client, error = %e, "Rate limit check failed");
            })?;

        if count <= self.threshold {
            return Ok(Decision::allow());
        }

        let retry_after_secs = (window_index + 1) * self.window_secs - now;
        tracing::warn!(
            client = %client,
            count,
            threshold = self.threshold,
            retry_after_secs,
            "Rate limit exceeded"
        );
        metrics::record_rate_limited();

        Ok(Decision {
            allowed: false,
            retry_after_secs,
        })
    }
}
