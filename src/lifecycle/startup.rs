//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize the metrics exporter
//! - Build the shared store, dependency and service in dependency order
//! - Start background tasks (in-memory store purge)
//! - Bind the listener and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::analytics::service::EXTERNAL_BREAKER;
use crate::analytics::{AnalyticsService, ServiceParts, SimulatedDependency, StoreHealth};
use crate::clock::{Clock, SystemClock};
use crate::config::{ServiceConfig, StoreBackend};
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::resilience::CircuitBreaker;
use crate::store::{MemoryStore, RedisStore, SharedStore, StoreError};

/// How often the in-memory store drops expired entries.
const PURGE_INTERVAL: Duration = Duration::from_secs(30);

/// Fatal startup or serve error.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to initialize shared store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Construct the configured shared store, spawning its maintenance task if any.
pub fn build_store(
    config: &ServiceConfig,
    clock: Arc<dyn Clock>,
    shutdown: &Shutdown,
) -> Result<Arc<dyn SharedStore>, StoreError> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory shared store");
            let store = MemoryStore::new(clock);
            spawn_purge(store.clone(), shutdown.subscribe());
            Ok(Arc::new(store))
        }
        StoreBackend::Redis => {
            let store = RedisStore::new(&config.store)?;
            tracing::info!(url = %store.url(), "Using Redis shared store");
            Ok(Arc::new(store))
        }
    }
}

fn spawn_purge(store: MemoryStore, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    store.purge_expired();
                    tracing::trace!(entries = store.len(), "Purged expired store entries");
                }
                _ = shutdown.recv() => break,
            }
        }
    });
}

/// Build the service and serve it until a termination signal.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_store(&config, clock.clone(), &shutdown)?;
    let dependency = Arc::new(SimulatedDependency::from_config(&config.external));
    let breaker = Arc::new(CircuitBreaker::new(
        EXTERNAL_BREAKER,
        &config.circuit_breaker,
        clock.clone(),
    ));
    let service = Arc::new(AnalyticsService::new(
        &config,
        ServiceParts {
            store,
            dependency,
            breaker,
            clock,
        },
    ));

    if service.health().await.store != StoreHealth::Healthy {
        tracing::warn!("Shared store not reachable at startup; requests will fail until it is");
    }

    let listener = TcpListener::bind(&config.server.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.server.bind_address.clone(),
            source,
        })?;

    tracing::info!(
        address = %config.server.bind_address,
        rate_limit_threshold = config.rate_limit.threshold,
        rate_limit_window_secs = config.rate_limit.window_secs,
        breaker_failure_threshold = config.circuit_breaker.failure_threshold,
        breaker_reset_timeout_secs = config.circuit_breaker.reset_timeout_secs,
        cache_default_ttl_secs = config.cache.default_ttl_secs,
        "Listening for connections"
    );

    let server = HttpServer::new(&config.server, service);
    let result = server.run(listener, shutdown.subscribe()).await;

    // Stop background tasks even when the server exited on its own.
    shutdown.trigger();
    result.map_err(StartupError::Serve)
}
