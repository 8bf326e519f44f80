//! Rotorwatch - condition-monitoring service for rotating machinery.
//!
//! # Usage
//!
//! ```bash
//! # Run with built-in defaults (five-component roster, 0.0.0.0:8080)
//! cargo run --release
//!
//! # Run with an explicit config file and bind address
//! cargo run --release -- --config machines/pump_station.toml --addr 127.0.0.1:9000
//! ```
//!
//! # Environment Variables
//!
//! - `ROTORWATCH_CONFIG`: Path to the TOML config file
//! - `ROTORWATCH_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use rotorwatch::api::{create_app, ApiState};
use rotorwatch::config::MonitorConfig;
use rotorwatch::engine::HealthEngine;

#[derive(Parser, Debug)]
#[command(name = "rotorwatch")]
#[command(about = "Condition-monitoring service for rotating machinery")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default from config: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to the TOML config file (overrides ROTORWATCH_CONFIG)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let config = match &args.config {
        Some(path) => MonitorConfig::load_from_file(std::path::Path::new(path))
            .with_context(|| format!("loading config from {path}"))?,
        None => MonitorConfig::load(),
    };

    let registry = config
        .build_registry()
        .context("building predictor registry from config")?;
    info!(
        components = registry.len(),
        roster = ?registry.component_names(),
        "predictor registry built"
    );

    let engine = Arc::new(HealthEngine::new(registry));
    let app = create_app(ApiState { engine });

    let addr = args.addr.unwrap_or_else(|| config.server.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    info!(%addr, "rotorwatch listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
    info!("shutdown signal received");
}
