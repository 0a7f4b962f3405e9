mod commands;
mod config;

use alloy_primitives::Address;
use clap::{Parser, Subcommand};
use config::CliConfig;
use scratchcard_game::GameError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scratchcard")]
#[command(about = "Scratch card lottery - stake, draw and scratch to reveal")]
#[command(version)]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// RPC endpoint of the node or signer
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Lottery contract address
    #[arg(long, global = true)]
    contract: Option<Address>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the network and show the connection state
    Status,
    /// Ask the wallet to switch to the required network
    Switch,
    /// Show the prize table and today's plays
    Prizes,
    /// Stake once, then scratch the card
    Play {
        /// Skip the stake confirmation
        #[arg(short, long)]
        yes: bool,
        /// Scratch strokes before the card is revealed anyway
        #[arg(short, long, default_value_t = 40)]
        strokes: usize,
    },
    /// Scratch a card offline with a chosen result
    ScratchDemo {
        /// Prize tier under the mask
        #[arg(short, long)]
        tier: u32,
        /// Prize amount in ether
        #[arg(short, long, default_value = "0")]
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "scratchcard={},scratchcard_core={},scratchcard_game={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = cli.config.unwrap_or_else(CliConfig::default_path);
    let config = CliConfig::load(&config_path)?.with_overrides(cli.rpc_url, cli.contract);

    let result = match cli.command {
        Commands::Status => commands::show_status(&config).await,
        Commands::Switch => commands::switch_network(&config).await,
        Commands::Prizes => commands::show_prizes(&config).await,
        Commands::Play { yes, strokes } => commands::play(&config, yes, strokes).await,
        Commands::ScratchDemo { tier, amount } => commands::scratch_demo(&config, tier, &amount).await,
    };

    if let Err(e) = result {
        match e.downcast_ref::<GameError>() {
            Some(GameError::DailyLimitReached { played, limit }) => {
                eprintln!("Error: Daily limit reached ({}/{} plays today)", played, limit);
                eprintln!("Come back tomorrow for more scratch cards");
            }
            Some(GameError::NotConnected) => {
                eprintln!("Error: Wallet is not connected");
                eprintln!("Use 'scratchcard switch' if the wallet is on another network");
            }
            _ => {
                eprintln!("Error: {:#}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}
