//! Versecast Hub Daemon - projection-state sync backend
//!
//! Runs as a background service hosting the singleton projection record.
//! Operator consoles publish to it; projector windows, companion devices
//! and spectator viewers subscribe and converge on every committed update.

mod config;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use crate::config::HubConfig;
use versecast_hub::ProjectionHub;

#[derive(Parser, Debug)]
#[command(name = "versecast-daemon", version, about = "Versecast projection hub")]
struct Args {
    /// Override the bind address from the config file
    #[arg(long)]
    bind: Option<String>,

    /// Use an alternate config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();

    info!("Starting Versecast hub daemon v{}", env!("CARGO_PKG_VERSION"));

    let mut config = HubConfig::load(args.config).context("Failed to load configuration")?;
    info!("Configuration loaded from {}", config.config_path.display());

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    let hub = ProjectionHub::new(config.bind_addr.clone());
    hub.start().await.context("Failed to start projection hub")?;

    if let Some(addr) = hub.local_addr().await {
        info!("Projection hub ready on {}", addr);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    hub.stop().await.context("Failed to stop projection hub")?;

    Ok(())
}
