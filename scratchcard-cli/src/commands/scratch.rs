use crate::config::CliConfig;
use rand::Rng;
use scratchcard_core::{format_ether, parse_ether};
use scratchcard_game::{PlayOutcome, Point, ScratchEngine, ScratchEvent, SharePayload};
use std::time::Instant;

/// Pointer samples per simulated stroke.
const STROKE_SAMPLES: usize = 12;
const DEMO_STROKES: usize = 40;

pub async fn scratch_demo(config: &CliConfig, tier: u32, amount: &str) -> anyhow::Result<()> {
    let no_prize_tier = config.game.no_prize_tier;
    if tier > no_prize_tier {
        anyhow::bail!("Tier must be between 0 and {}", no_prize_tier);
    }

    let outcome = PlayOutcome::settle(tier, parse_ether(amount)?, no_prize_tier);
    reveal_card(config, outcome, DEMO_STROKES).await
}

/// Scratches a fresh card hiding `outcome` with random strokes, forcing the
/// reveal if `max_strokes` were not enough.
pub(crate) async fn reveal_card(
    config: &CliConfig,
    outcome: PlayOutcome,
    max_strokes: usize,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        config.card_width > 0 && config.card_height > 0,
        "Card size must be positive, got {}x{}",
        config.card_width,
        config.card_height
    );
    config.scratch.validate()?;

    let mut engine =
        ScratchEngine::with_raster(config.card_width, config.card_height, config.scratch.clone());
    engine.load(outcome);

    let symbol = config.chain.native_currency.symbol.clone();
    let no_prize_tier = config.game.no_prize_tier;
    engine.on_complete(move |revealed| {
        if let Some(outcome) = revealed {
            print_result(&outcome, no_prize_tier, &symbol);
        }
    });

    scratch(&mut engine, config, max_strokes);
    if !engine.is_revealed() {
        println!("Revealing the rest of the card...");
        engine.reveal(Instant::now());
    }

    tokio::time::sleep(config.scratch.fade_duration()).await;
    engine.tick(Instant::now());
    Ok(())
}

fn scratch(engine: &mut ScratchEngine, config: &CliConfig, max_strokes: usize) {
    let mut rng = rand::rng();
    let width = config.card_width as f32;
    let height = config.card_height as f32;
    let step = config.scratch.brush_radius;

    for stroke in 1..=max_strokes {
        if engine.on_pointer_down() == Some(ScratchEvent::Started) {
            println!("Scratching...");
        }

        let mut position = Point::new(rng.random_range(0.0..width), rng.random_range(0.0..height));
        for _ in 0..STROKE_SAMPLES {
            if engine.on_pointer_move(position) == Some(ScratchEvent::Revealed) {
                engine.on_pointer_up();
                println!("Card revealed after {} strokes", stroke);
                return;
            }
            position = Point::new(
                position.x + rng.random_range(-step..step),
                position.y + rng.random_range(-step..step),
            );
        }

        engine.on_pointer_up();
        println!(
            "  stroke {:>2}: {:>5.1}% scratched",
            stroke,
            engine.state().scratched_fraction * 100.0
        );
    }
}

fn print_result(outcome: &PlayOutcome, no_prize_tier: u32, symbol: &str) {
    println!();
    if outcome.is_no_prize(no_prize_tier) {
        println!("No prize this time. Better luck next card!");
        return;
    }

    println!(
        "You won {} {} (tier {})!",
        format_ether(outcome.amount_wei),
        symbol,
        outcome.tier
    );
    if let Some(share) = SharePayload::for_outcome(outcome, no_prize_tier, symbol) {
        println!("Share: {} - {}", share.title, share.text);
    }
}
