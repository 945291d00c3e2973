//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use metrics_gate::analytics::service::EXTERNAL_BREAKER;
use metrics_gate::analytics::{AnalyticsService, DependencyError, ExternalDependency, ServiceParts};
use metrics_gate::clock::ManualClock;
use metrics_gate::config::{ServiceConfig, StoreBackend};
use metrics_gate::http::HttpServer;
use metrics_gate::lifecycle::Shutdown;
use metrics_gate::resilience::CircuitBreaker;
use metrics_gate::store::{MemoryStore, SharedStore, StoreError, StoreResult};

/// Start of an aligned 60s window, so retry hints are deterministic.
pub const START: Duration = Duration::from_secs(1_700_000_040);

/// Dependency with a switchable outcome that counts its calls.
#[derive(Debug, Default)]
pub struct ScriptedDependency {
    pub failing: std::sync::atomic::AtomicBool,
    pub calls: AtomicUsize,
}

impl ScriptedDependency {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let dep = Self::default();
        dep.failing.store(true, Ordering::SeqCst);
        Arc::new(dep)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExternalDependency for ScriptedDependency {
    async fn fetch(&self) -> Result<Value, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(DependencyError::Failed("injected failure".into()))
        } else {
            Ok(json!({"status": "success", "external_metric_context": 321}))
        }
    }
}

/// A store whose backend is never reachable.
#[derive(Debug)]
pub struct DownStore;

#[async_trait]
impl SharedStore for DownStore {
    async fn increment_and_expire(&self, _: &str, _: Duration) -> StoreResult<u64> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn get(&self, _: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn set_with_ttl(&self, _: &str, _: &str, _: Duration) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Config for in-process tests: memory store, no metrics exporter.
pub fn test_config() -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config.store.backend = StoreBackend::Memory;
    config.observability.metrics_enabled = false;
    config
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub service: Arc<AnalyticsService>,
    pub clock: Arc<ManualClock>,
    pub shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Build the service on a manual clock. `store` defaults to a memory store.
pub fn build_service(
    config: &ServiceConfig,
    store: Option<Arc<dyn SharedStore>>,
    dependency: Arc<dyn ExternalDependency>,
) -> (Arc<AnalyticsService>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let store = store.unwrap_or_else(|| Arc::new(MemoryStore::new(clock.clone())));
    let service = AnalyticsService::new(
        config,
        ServiceParts {
            store,
            dependency,
            breaker: Arc::new(CircuitBreaker::new(
                EXTERNAL_BREAKER,
                &config.circuit_breaker,
                clock.clone(),
            )),
            clock: clock.clone(),
        },
    );
    (Arc::new(service), clock)
}

/// Serve the API on an ephemeral local port.
pub async fn start_server(
    config: ServiceConfig,
    store: Option<Arc<dyn SharedStore>>,
    dependency: Arc<dyn ExternalDependency>,
) -> TestServer {
    let (service, clock) = build_service(&config, store, dependency);

    let listener = TcpListener::bind(&config.server.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config.server, service.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        addr,
        service,
        clock,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn metric_body(kind: &str, value: f64) -> Value {
    json!({
        "timestamp": "2024-01-01T12:00:00Z",
        "value": value,
        "type": kind,
    })
}
