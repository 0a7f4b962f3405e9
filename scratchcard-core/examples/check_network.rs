use scratchcard_core::{ChainConfig, ChainGate, ConnectionState, JsonRpcProvider, WalletProvider};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8545".to_string());
    println!("Using RPC endpoint: {}", url);

    let provider: Arc<dyn WalletProvider> = Arc::new(JsonRpcProvider::new(&url)?);
    let gate = ChainGate::new(Some(provider), ChainConfig::sepolia())?;

    println!("Checking network...");
    match gate.check_network().await {
        ConnectionState::WrongNetwork { observed } => {
            println!("Wallet is on chain {}, requesting switch", observed);
            if !gate.request_switch().await {
                println!("Switch failed: {:?}", gate.last_notice());
                return Ok(());
            }
        }
        state => println!("State: {}", state),
    }

    let state = gate.connect().await?;
    println!("\n{}", state);

    if let Some(context) = gate.execution_context() {
        println!("Account: {}", context.short_account());
        println!("Chain: {} ({})", context.chain_id(), context.chain_id().hex());
    }

    Ok(())
}
