use super::prizes::print_prizes;
use super::scratch::reveal_card;
use super::open_client;
use crate::config::CliConfig;
use dialoguer::Confirm;
use scratchcard_core::format_ether;
use scratchcard_game::TransactionState;

pub async fn play(config: &CliConfig, yes: bool, strokes: usize) -> anyhow::Result<()> {
    let client = open_client(config)?;

    let mut state = client.connect_or_switch().await?;
    if !state.is_connected() {
        state = client.connect().await?;
    }
    println!("{}", state);
    print_prizes(&client, config);

    let symbol = &config.chain.native_currency.symbol;
    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!(
                "Stake {} {} for one scratch card?",
                format_ether(config.game.stake_wei),
                symbol
            ))
            .default(true)
            .interact()?;

        if !confirm {
            tracing::info!("Play cancelled at the stake prompt");
            println!("Play cancelled.");
            return Ok(());
        }
    }

    let mut states = client.session().watch_state();
    let progress = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            match state {
                TransactionState::Submitting => println!("Waiting for the wallet to sign..."),
                TransactionState::AwaitingConfirmation(hash) => {
                    println!("Transaction {} pending...", hash)
                }
                _ => {}
            }
        }
    });

    let outcome = client.play().await;
    progress.abort();
    let outcome = outcome?;
    tracing::info!("Play settled on tier {} ({} wei)", outcome.tier, outcome.amount_wei);

    reveal_card(config, outcome, strokes).await?;

    let ledger = client.ledger();
    println!(
        "Plays left today: {}/{}",
        ledger.plays_left(),
        ledger.daily_limit()
    );
    Ok(())
}
