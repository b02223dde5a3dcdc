use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use hub_api::create_app;
use hub_core::{StationConfig, StationStore};
use hub_engine::SimulationDriver;
use tracing_subscriber::EnvFilter;

/// Command line arguments for the hub-station server
#[derive(Parser, Debug)]
#[command(name = "hub-station")]
#[command(about = "Highway electric-truck charging station simulator")]
struct Args {
    /// Path to the station configuration JSON file, defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to bind the server to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Seed for the simulated telemetry, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Serve the API without the background simulation
    #[arg(long)]
    no_simulation: bool,
}

async fn load_config(path: &Path) -> Result<StationConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl+C: {}", error);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut station_config = match &args.config {
        Some(path) => {
            let config = load_config(path).await?;
            tracing::info!(
                "Loaded station config from {}: {}",
                path.display(),
                config.station_name
            );
            config
        }
        None => StationConfig::default(),
    };
    if let Some(seed) = args.seed {
        station_config.simulation.seed = Some(seed);
    }
    let simulation = station_config.simulation.clone();
    let store = StationStore::from_config(station_config)
        .context("Invalid station configuration")?;
    let store = hub_engine::shared(store);

    let driver = if args.no_simulation {
        None
    } else {
        Some(SimulationDriver::new(store.clone(), simulation).start())
    };

    let app = create_app(store);

    let bind_addr = format!("0.0.0.0:{}", args.port);
    tracing::info!("Starting server on {}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(driver) = driver {
        driver.stop().await;
    }

    Ok(())
}
