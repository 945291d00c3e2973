//! Metrics gate (v1)
//!
//! Ingests metrics and serves per-type summaries behind shared admission
//! control, a read-through cache and a circuit-broken external dependency.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────┐
//!                        │                  METRICS GATE                     │
//!                        │                                                   │
//!   Client Request       │  ┌────────┐   ┌──────────┐   ┌────────────────┐  │
//!   ─────────────────────┼─▶│  http  │──▶│ security │──▶│   analytics    │  │
//!                        │  │ server │   │ identity │   │    service     │  │
//!                        │  └────────┘   │ + limit  │   └───┬────────┬───┘  │
//!                        │               └────┬─────┘       │        │      │
//!                        │                    │        ┌────▼──┐ ┌───▼────┐ │
//!                        │                    │        │ cache │ │breaker │─┼──▶ External
//!                        │                    ▼        └───┬───┘ └────────┘ │    dependency
//!                        │               ┌──────────────────▼─┐              │
//!                        │               │    shared store    │──────────────┼──▶ Redis
//!                        │               └────────────────────┘              │
//!                        └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use metrics_gate::config::load_config;
use metrics_gate::lifecycle::startup;
use metrics_gate::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "metrics-gate")]
#[command(about = "Metrics ingestion and summary service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "METRICS_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!("metrics-gate v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
