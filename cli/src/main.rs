use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{gateway, mappings, run};
use config::RelayConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Mapping file override (default: RELAY_MAPPINGS_FILE or ./mappings.json)
    #[arg(short, long, value_name = "FILE", global = true)]
    mappings: Option<PathBuf>,

    /// State directory override (default: RELAY_STATE_DIR or ./relay-state)
    #[arg(short, long, value_name = "DIR", global = true)]
    state_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay against every configured chain
    Run,
    /// Probe the ledger gateway health endpoint
    Health,
    /// Show the ledger gateway audit snapshot
    Audit,
    /// Show ledger balances for an account
    Balance {
        #[arg(long)]
        account: String,
        /// Restrict the output to one asset symbol
        #[arg(long)]
        asset: Option<String>,
    },
    /// Inspect the address and asset mapping tables
    Mappings {
        /// Print the tables as JSON instead of formatted output
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::from_env();
    if let Some(path) = cli.mappings {
        config.mappings_file = path;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }

    match cli.command {
        Commands::Run => {
            info!("starting relay against gateway {}", config.gateway_url);
            run::start(&config).await
        }
        Commands::Health => gateway::health(&config).await,
        Commands::Audit => gateway::audit(&config).await,
        Commands::Balance { account, asset } => {
            gateway::balance(&config, &account, asset.as_deref()).await
        }
        Commands::Mappings { json } => mappings::show(&config, json),
    }
}
