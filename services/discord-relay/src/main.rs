//! Discord relay CLI
//!
//! Runs the authenticated DM relay until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use clap::Parser;
use discord_relay::{load_config, Config, RelayBuilder};
use tokio_util::sync::CancellationToken;
use tracing::Level;

#[derive(Parser)]
#[command(name = "discord-relay")]
#[command(about = "Delivers Discord direct messages on behalf of WHMCS")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port (overrides config file and PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::debug!("Received Ctrl+C"),
        _ = terminate => tracing::debug!("Received SIGTERM"),
    }
    cancel.cancel();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, port={:?}, log_level={:?}",
        args.config,
        args.port,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.apply_env_overrides()?;
    config.resolve_secrets()?;

    if let Some(port) = args.port {
        config.port = port;
    }

    config.validate()?;
    tracing::debug!("Relay configuration: {:?}", config);

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    tracing::info!("Starting Discord relay");
    let relay = match RelayBuilder::new(config)
        .with_cancellation_token(cancel)
        .build()
        .await
    {
        Ok(relay) => relay,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            return Err(e.into());
        }
    };

    relay.start().await?;
    Ok(())
}
