//! WHMCS notifier CLI
//!
//! Delivers a WHMCS notification event to the client's Discord DMs.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use whmcs_notifier::hooks::{self, TriggerRequest};
use whmcs_notifier::{
    build_pipeline, load_config, load_event, Config, ConnectionStatus, PipelineOutcome,
};

#[derive(Parser)]
#[command(name = "whmcs-notifier")]
#[command(about = "Sends WHMCS notifications to clients as Discord direct messages")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Relay endpoint URL (overrides config file)
    #[arg(long, global = true)]
    relay_url: Option<String>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve and deliver one notification event
    Send {
        /// JSON file holding the event
        #[arg(long)]
        event: PathBuf,
    },
    /// Raise one of the built-in billing hook notifications
    Hook {
        /// Billing site host name used in the event links
        #[arg(long)]
        host: String,

        #[command(subcommand)]
        hook: HookCommand,
    },
    /// Check that the relay is reachable and its bot is logged in
    TestConnection,
}

#[derive(Subcommand)]
enum HookCommand {
    /// An invoice payment failed or was reversed
    InvoiceUnpaid {
        #[arg(long)]
        invoice_id: String,
    },
    /// An affiliate account was activated
    AffiliateActivation {
        #[arg(long)]
        affiliate_id: String,
        #[arg(long)]
        user_id: String,
    },
    /// An affiliate asked to withdraw their balance
    AffiliateWithdrawal {
        #[arg(long)]
        affiliate_id: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        client_id: String,
        #[arg(long)]
        balance: f64,
    },
}

impl HookCommand {
    fn trigger(self, host: &str) -> TriggerRequest {
        match self {
            HookCommand::InvoiceUnpaid { invoice_id } => hooks::invoice_unpaid(host, &invoice_id),
            HookCommand::AffiliateActivation {
                affiliate_id,
                user_id,
            } => hooks::affiliate_activation(host, &affiliate_id, &user_id),
            HookCommand::AffiliateWithdrawal {
                affiliate_id,
                user_id,
                client_id,
                balance,
            } => hooks::affiliate_withdrawal(host, &affiliate_id, &user_id, &client_id, balance),
        }
    }
}

fn report(outcome: &PipelineOutcome) {
    match outcome {
        PipelineOutcome::Delivered => println!("Delivered"),
        PipelineOutcome::SoftFailed { reason } => println!("Not delivered: {}", reason),
        other => println!("Skipped: {:?}", other),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, relay_url={:?}, log_level={:?}",
        args.config,
        args.relay_url,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    if let Some(relay_url) = args.relay_url {
        config.relay.api_url = relay_url;
    }

    let pipeline = build_pipeline(config.clone())?;

    match args.command {
        Command::Send { event } => {
            let event = load_event(&event)?;
            tracing::info!("Processing notification: {}", event.title());
            report(&pipeline.process(&event).await);
        }
        Command::Hook { host, hook } => {
            report(&hook.trigger(&host).fire(&pipeline).await);
        }
        Command::TestConnection => match pipeline.dispatcher().test_connection(&config.relay).await {
            ConnectionStatus::Ok => println!("Relay connection OK"),
            ConnectionStatus::Failed(reason) => {
                println!("Relay connection failed: {}", reason);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
