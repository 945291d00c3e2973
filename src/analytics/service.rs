//! Request orchestration.
//!
//! # Data Flow
//! ```text
//! ingest:    rate limiter → metric store append
//! summarize: rate limiter → result cache ─hit──────────────────────────▶ summary
//!                                       └miss→ aggregate → breaker(dependency) → cache write
//! health:    store ping → healthy / unhealthy
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::analytics::external::{DependencyError, ExternalDependency};
use crate::analytics::metric_store::MetricStore;
use crate::analytics::types::{
    fallback_error, fallback_unavailable, round2, summary_cache_key, IngestAck, Metric, Summary,
};
use crate::cache::ResultCache;
use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::error::{ApiError, ApiResult};
use crate::observability::metrics;
use crate::resilience::{with_deadline, BreakerError, CircuitBreaker};
use crate::security::{ClientId, RateLimiter};
use crate::store::SharedStore;

/// Name of the breaker guarding the external dependency.
pub const EXTERNAL_BREAKER: &str = "external_data";

/// Reachability of the shared store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreHealth {
    Healthy,
    Unhealthy,
}

/// Health probe payload. The probe itself never fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub store: StoreHealth,
}

/// Collaborators the service is assembled from.
pub struct ServiceParts {
    pub store: Arc<dyn SharedStore>,
    pub dependency: Arc<dyn ExternalDependency>,
    /// Breaker guarding `dependency`, usually named [`EXTERNAL_BREAKER`].
    pub breaker: Arc<CircuitBreaker>,
    pub clock: Arc<dyn Clock>,
}

/// The request-handling core: admission, caching and guarded enrichment.
pub struct AnalyticsService {
    store: Arc<dyn SharedStore>,
    limiter: RateLimiter,
    cache: ResultCache,
    breaker: Arc<CircuitBreaker>,
    dependency: Arc<dyn ExternalDependency>,
    dependency_timeout: Duration,
    metrics: Arc<MetricStore>,
}

impl AnalyticsService {
    /// Assemble the service from explicit collaborators.
    pub fn new(config: &ServiceConfig, parts: ServiceParts) -> Self {
        let ServiceParts {
            store,
            dependency,
            breaker,
            clock,
        } = parts;

        Self {
            limiter: RateLimiter::new(&config.rate_limit, store.clone(), clock),
            cache: ResultCache::new(store.clone(), config.cache.default_ttl()),
            breaker,
            dependency,
            dependency_timeout: Duration::from_millis(config.external.timeout_ms),
            metrics: Arc::new(MetricStore::new()),
            store,
        }
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn metric_store(&self) -> &MetricStore {
        &self.metrics
    }

    async fn admit(&self, client: &ClientId) -> ApiResult<()> {
        let decision = self.limiter.check(client).await?;
        if decision.allowed {
            Ok(())
        } else {
            Err(ApiError::RateLimited {
                retry_after_secs: decision.retry_after_secs,
            })
        }
    }

    /// Admit and record one metric.
    pub async fn ingest(&self, client: &ClientId, metric: Metric) -> ApiResult<IngestAck> {
        self.admit(client).await?;

        tracing::debug!(
            client = %client,
            metric_type = %metric.metric_type,
            value = metric.value,
            "Metric ingested"
        );
        self.metrics.append(metric);
        metrics::record_ingested();

        Ok(IngestAck::received())
    }

    /// Admit and return the (possibly cached) summary for `metric_type`.
    pub async fn summarize(&self, client: &ClientId, metric_type: &str, period: &str) -> ApiResult<Summary> {
        self.admit(client).await?;

        let key = summary_cache_key(metric_type, period);
        self.cache
            .get_or_compute(&key, || self.compute_summary(metric_type, period), None)
            .await
    }

    async fn compute_summary(&self, metric_type: &str, period: &str) -> ApiResult<Summary> {
        let aggregate = self.metrics.aggregate(metric_type);
        let external_data = self.fetch_external().await;

        Ok(Summary {
            metric_type: metric_type.to_string(),
            period: period.to_string(),
            average_value: round2(aggregate.mean),
            count: aggregate.count,
            external_data: Some(external_data),
        })
    }

    /// Call the dependency through the breaker, substituting a fallback on any failure.
    async fn fetch_external(&self) -> Value {
        let dependency = &self.dependency;
        let limit = self.dependency_timeout;

        let result = self
            .breaker
            .call(|| async move {
                match with_deadline(limit, dependency.fetch()).await {
                    Ok(result) => result,
                    Err(elapsed) => Err(DependencyError::Timeout(elapsed.0.as_millis() as u64)),
                }
            })
            .await;

        match result {
            Ok(data) => data,
            Err(BreakerError::Open) => {
                tracing::info!(breaker = EXTERNAL_BREAKER, "Circuit open, using fallback external data");
                fallback_unavailable()
            }
            Err(BreakerError::Inner(e)) => {
                tracing::warn!(error = %e, "External dependency failed, using fallback");
                fallback_error()
            }
        }
    }

    /// Report store reachability without ever failing.
    pub async fn health(&self) -> HealthReport {
        let store = match self.store.ping().await {
            Ok(()) => StoreHealth::Healthy,
            Err(e) => {
                tracing::warn!(error = %e, "Health probe: shared store unreachable");
                StoreHealth::Unhealthy
            }
        };
        HealthReport { status: "ok", store }
    }
}
