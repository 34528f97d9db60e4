//! Command-line front end for the scoring engine.
//!
//! Loads a game configuration JSON (as exported by the administrative
//! system) and a flat JSON object of raw player inputs, runs one
//! calculation, and prints the `PerformanceResult` as JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sa_core::{calculate_player_performance, Game, InputValue, PlayerInputSet};

#[derive(Parser, Debug)]
#[command(name = "sa_cli", version, about = "Run a player performance calculation")]
struct Args {
    /// Path to the game configuration JSON.
    #[arg(long)]
    game: PathBuf,

    /// Player identifier for the result record.
    #[arg(long)]
    player: String,

    /// Path to a flat JSON object of raw inputs, e.g. {"score": 90}.
    #[arg(long)]
    inputs: PathBuf,

    /// Pretty-print the result.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let game_json = fs::read_to_string(&args.game)
        .with_context(|| format!("reading game configuration {}", args.game.display()))?;
    let game: Game =
        serde_json::from_str(&game_json).context("parsing game configuration")?;

    let inputs_json = fs::read_to_string(&args.inputs)
        .with_context(|| format!("reading inputs {}", args.inputs.display()))?;
    let values: BTreeMap<String, InputValue> =
        serde_json::from_str(&inputs_json).context("parsing raw inputs")?;

    let inputs = PlayerInputSet {
        player_id: args.player,
        game_id: game.game_id.clone(),
        values,
    };

    let result = calculate_player_performance(&game, &inputs)?;

    let out = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", out);
    Ok(())
}
