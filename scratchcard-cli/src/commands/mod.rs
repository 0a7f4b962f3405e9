pub mod network;
pub mod play;
pub mod prizes;
pub mod scratch;

pub use network::{show_status, switch_network};
pub use play::play;
pub use prizes::show_prizes;
pub use scratch::scratch_demo;

use crate::config::CliConfig;
use scratchcard_core::{JsonRpcProvider, WalletProvider};
use scratchcard_game::GameClient;
use std::sync::Arc;
use std::time::Duration;

/// Builds a client against the configured endpoint and starts following
/// chain and account changes.
pub(crate) fn open_client(config: &CliConfig) -> anyhow::Result<GameClient> {
    let rpc_url = config.rpc_url()?;
    tracing::info!("Connecting to {}", rpc_url);
    let provider = Arc::new(JsonRpcProvider::new(rpc_url)?);
    provider.watch(Duration::from_millis(config.watch_interval_ms));
    tracing::debug!("Watching for wallet changes every {}ms", config.watch_interval_ms);

    let provider: Arc<dyn WalletProvider> = provider;
    let client = GameClient::new(Some(provider), config.chain.clone(), config.game.clone())?;
    client.observe();
    Ok(client)
}
