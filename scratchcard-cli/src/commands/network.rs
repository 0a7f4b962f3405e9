use super::open_client;
use crate::config::CliConfig;
use scratchcard_core::ConnectionState;

pub async fn show_status(config: &CliConfig) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let gate = client.gate();

    println!("Required network: {} ({})", gate.config().chain_name, gate.required_chain());
    println!("Contract: {}", config.game.contract_address);

    match gate.check_network().await {
        ConnectionState::WrongNetwork { observed } => {
            println!("Status: wrong network (chain {})", observed);
            println!("Run 'scratchcard switch' to change network");
        }
        _ => match client.connect().await {
            Ok(state) => {
                println!("Status: {}", state);
                let ledger = client.ledger();
                println!(
                    "Plays left today: {}/{}",
                    ledger.plays_left(),
                    ledger.daily_limit()
                );
            }
            Err(e) => println!("Status: {} ({})", gate.state(), e),
        },
    }

    if let Some(notice) = gate.last_notice() {
        println!("Last notice: {} at {}", notice.reason, notice.at.format("%H:%M:%S"));
    }

    Ok(())
}

pub async fn switch_network(config: &CliConfig) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let gate = client.gate();

    if let ConnectionState::Disconnected = gate.check_network().await {
        println!("Already on {}", gate.config().chain_name);
        return Ok(());
    }

    println!("Switching to {}...", gate.config().chain_name);
    if gate.request_switch().await {
        println!("Switched to {}", gate.config().chain_name);
    } else {
        let reason = gate
            .last_notice()
            .map(|notice| notice.reason)
            .unwrap_or_else(|| "wallet stayed on another network".to_string());
        anyhow::bail!("{}", reason);
    }

    Ok(())
}
