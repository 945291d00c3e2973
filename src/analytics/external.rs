//! External context provider.
//!
//! Summaries are enriched with data from a downstream service that is slow
//! and unreliable. The shipped provider simulates it.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::ExternalConfig;

/// Failure of the downstream call.
#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("external service failure: {0}")]
    Failed(String),

    #[error("external service timed out after {0}ms")]
    Timeout(u64),
}

/// A downstream service that provides context for summaries.
#[async_trait]
pub trait ExternalDependency: Send + Sync {
    async fn fetch(&self) -> Result<Value, DependencyError>;
}

/// Simulated flaky dependency: fixed latency, random failures.
#[derive(Debug, Clone)]
pub struct SimulatedDependency {
    failure_rate: f64,
    latency: Duration,
}

impl SimulatedDependency {
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
        }
    }

    pub fn from_config(config: &ExternalConfig) -> Self {
        Self::new(config.failure_rate, Duration::from_millis(config.latency_ms))
    }
}

#[async_trait]
impl ExternalDependency for SimulatedDependency {
    async fn fetch(&self) -> Result<Value, DependencyError> {
        tokio::time::sleep(self.latency).await;

        if fastrand::f64() < self.failure_rate {
            return Err(DependencyError::Failed(
                "Simulated external service failure due to high load.".to_string(),
            ));
        }

        Ok(json!({
            "status": "success",
            "external_metric_context": fastrand::u32(100..=500),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_never_fails_at_zero_rate() {
        let dep = SimulatedDependency::new(0.0, Duration::ZERO);
        for _ in 0..20 {
            let data = dep.fetch().await.unwrap();
            assert_eq!(data["status"], "success");
            let ctx = data["external_metric_context"].as_u64().unwrap();
            assert!((100..=500).contains(&ctx));
        }
    }

    #[tokio::test]
    async fn test_always_fails_at_full_rate() {
        let dep = SimulatedDependency::new(1.0, Duration::ZERO);
        for _ in 0..20 {
            assert!(matches!(dep.fetch().await, Err(DependencyError::Failed(_))));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let dep = SimulatedDependency::new(0.0, Duration::from_millis(50));
        let start = tokio::time::Instant::now();
        dep.fetch().await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
