//! Watchpost CLI
//!
//! Command-line entry point for the surveillance dashboard.

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;
use watchpost::{load_config, Config};

#[derive(Parser)]
#[command(name = "watchpost")]
#[command(about = "Multi-camera surveillance dashboard")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides config file and environment)
    #[arg(long)]
    backend_url: Option<String>,

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

    tracing::debug!(
        "Parsed command line arguments: config={:?}, backend_url={:?}, dashboard_port={:?}, log_level={:?}",
        args.config,
        args.backend_url,
        args.dashboard_port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_env();

    if let Some(backend_url) = args.backend_url {
        config.backend.base_url = backend_url;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    config.validate()?;

    tracing::info!("Starting watchpost against {}", config.backend.base_url);
    tracing::debug!(
        "Login mode: {:?}, Notifiers: {}, Alert capacity: {}",
        config.backend.login.mode,
        config.notifiers.len(),
        config.alerts.capacity
    );

    watchpost::run(config).await?;

    Ok(())
}
