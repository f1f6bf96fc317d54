//! Graphwatch Binary Entry Point
//!
//! This binary runs the complete graphwatch agent. Core functionality is
//! provided by the `graphwatch` library crate.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use graphwatch::{
    collector::CollectorRegistry,
    collector::neo4j::Neo4jCollector,
    config::AppConfig,
    output::{Accumulator, OutputBuilder, OutputTarget},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Graphwatch - Neo4j Transaction Monitoring Agent
#[derive(Parser, Debug)]
#[command(name = "graphwatch", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "GRAPHWATCH_CONFIG"
    )]
    config: String,

    /// Output file path (overrides config file; "-" forces stdout)
    #[arg(long, env = "GRAPHWATCH_OUTPUT")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,graphwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Graphwatch - Neo4j Transaction Monitoring Agent");

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load_with_collector_path(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(output) = cli.output {
        config.output.path = if output.as_os_str() == "-" {
            None
        } else {
            Some(output)
        };
    }

    // Build output pipeline
    let target = OutputTarget::from_path(config.output.path.as_deref());
    tracing::info!(
        "Output: {} ({})",
        match &target {
            OutputTarget::Stdout => "stdout".to_string(),
            OutputTarget::File(p) => p.display().to_string(),
        },
        config.output.format,
    );

    let handles = OutputBuilder::new(target)
        .format(config.output.format)
        .channel_capacity(config.output.channel_capacity)
        .flush_interval(config.output.flush_interval)
        .build()?;

    // Initialize collector registry
    tracing::info!("Starting collector registry...");
    let registry = CollectorRegistry::new().await?;

    let accumulator: Arc<dyn Accumulator> = Arc::new(handles.writer.clone());
    let mut spawned = 0;
    for collector_config in config.collectors.neo4j.clone() {
        if !collector_config.enabled {
            tracing::debug!("Skipping disabled collector: {}", collector_config.name);
            continue;
        }

        let name = collector_config.name.clone();
        let collector = Neo4jCollector::new(collector_config, Arc::clone(&accumulator));
        registry.spawn(collector).await?;
        tracing::info!("Spawned collector: {}", name);
        spawned += 1;
    }

    if spawned == 0 {
        tracing::warn!("No enabled collectors configured; nothing will be sampled");
    }

    registry.start().await?;
    tracing::info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;

    tracing::info!("Shutting down collectors...");
    if let Err(e) = registry.shutdown().await {
        tracing::error!("Failed to shutdown collectors: {}", e);
    }

    tracing::info!("Shutting down output...");
    if let Err(e) = handles.shutdown() {
        tracing::error!("Failed to shutdown output: {}", e);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
