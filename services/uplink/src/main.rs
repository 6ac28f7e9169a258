//! Uplink CLI
//!
//! Command-line interface for the AgroSmart connectivity supervisor.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use uplink::{load_config, Config};

#[derive(Parser)]
#[command(name = "uplink")]
#[command(about = "AgroSmart backend connectivity supervisor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    tracing::info!("Starting uplink connectivity supervisor");
    uplink::run(config).await?;

    Ok(())
}
