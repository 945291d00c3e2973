//! Metric ingestion and summary subsystem.
//!
//! # Data Flow
//! ```text
//! POST /api/metrics          → service.rs ingest    → metric_store.rs append
//! GET  /api/metrics/summary  → service.rs summarize → cache → metric_store.rs scan
//!                                                          → external.rs (via circuit breaker)
//! ```
//!
//! # Design Decisions
//! - Metrics are held in memory for the process lifetime, no eviction
//! - The external dependency is a trait so tests can script it
//! - Dependency failures degrade the summary, never the request

pub mod external;
pub mod metric_store;
pub mod service;
pub mod types;

pub use external::{DependencyError, ExternalDependency, SimulatedDependency};
pub use metric_store::MetricStore;
pub use service::{AnalyticsService, HealthReport, ServiceParts, StoreHealth};
pub use types::{IngestAck, Metric, Summary};
