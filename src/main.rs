use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use tempcast::web::{self, AppState};
use tempcast::{PredictionService, SqlApiWarehouse, TempcastConfig, Warehouse, logging};

/// Monthly temperature prediction dashboard backed by a warehouse-hosted model
#[derive(Debug, Parser)]
#[command(name = "tempcast", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding server.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = TempcastConfig::load_from_path(cli.config.clone())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    logging::init(&config.logging, cli.verbose);
    tracing::info!("tempcast {} starting", tempcast::VERSION);
    if let Some(path) = &cli.config {
        tracing::debug!("Using config from: {}", path.display());
    }

    config.validate_credentials()?;
    let catalog = config.location_catalog()?;

    let warehouse: Arc<dyn Warehouse> = Arc::new(
        SqlApiWarehouse::new(&config.warehouse).context("Failed to create warehouse client")?,
    );
    let service = PredictionService::from_config(warehouse, &config.model)
        .context("Invalid model configuration")?;
    tracing::info!(
        "Serving {} location(s), predicting {}",
        catalog.len(),
        service.prediction_year()
    );

    web::run(AppState::new(catalog, service), &config.server).await?;
    Ok(())
}
