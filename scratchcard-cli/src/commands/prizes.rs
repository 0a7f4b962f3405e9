use super::open_client;
use crate::config::CliConfig;
use comfy_table::{presets::UTF8_FULL, Table};
use scratchcard_game::{GameClient, PrizeTier};

pub async fn show_prizes(config: &CliConfig) -> anyhow::Result<()> {
    let client = open_client(config)?;
    let state = client.connect().await?;
    println!("{}", state);
    print_prizes(&client, config);
    Ok(())
}

pub(crate) fn print_prizes(client: &GameClient, config: &CliConfig) {
    let ledger = client.ledger();
    let tiers = client.prizes();
    let symbol = &config.chain.native_currency.symbol;

    if tiers.is_empty() {
        println!("Prize table unavailable.");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Tier", "Prize", "Remaining", "Chance"]);

        for tier in &tiers {
            table.add_row(vec![
                tier.tier.to_string(),
                prize_label(tier, config.game.no_prize_tier, symbol),
                format!("{}/{}", tier.remaining, tier.total),
                format!("{:.2}%", tier.probability_percent(ledger.probability_scale())),
            ]);
        }

        println!("{}", table);
    }

    match ledger.played_today() {
        Some(played) => println!(
            "Played today: {}/{} ({} left)",
            played,
            ledger.daily_limit(),
            ledger.plays_left()
        ),
        None => println!("Played today: unknown"),
    }
}

fn prize_label(tier: &PrizeTier, no_prize_tier: u32, symbol: &str) -> String {
    if tier.tier == no_prize_tier {
        return "No prize".to_string();
    }
    let label = format!("{} {}", tier.amount_ether(), symbol);
    if tier.is_sold_out() {
        format!("{} (sold out)", label)
    } else {
        label
    }
}
