//! Write a random initial/goal pair for experimenting with the planner.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use gantry_core::Board;
use gantry_core::scatter::{Scatter, scatter, shuffle};
use log::info;
use rand::prelude::*;
use rand::rngs::StdRng;

#[derive(Parser, Debug)]
#[command(name = "gantry-scatter")]
#[command(about = "Generate a random initial state and a reachable goal")]
struct Args {
    /// Number of blocks
    #[arg(short, long, default_value_t = 5)]
    blocks: usize,

    /// Tallest stack, in blocks
    #[arg(short, long, default_value_t = 3)]
    max_stack: usize,

    /// Board edge length
    #[arg(long, default_value_t = 11)]
    size: i32,

    /// RNG seed (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Where to write the initial state
    #[arg(short, long, default_value = "initial.txt")]
    initial: PathBuf,

    /// Where to write the goal state
    #[arg(short, long, default_value = "goal.txt")]
    goal: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(|| StdRng::from_os_rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let cfg = Scatter {
        blocks: args.blocks,
        max_stack: args.max_stack,
        board: Board::new(0, 0, args.size, args.size),
        ..Scatter::default()
    };

    let initial = scatter(&mut rng, &cfg).context("generating the initial state")?;
    let goal = shuffle(&mut rng, &initial, &cfg).context("generating the goal state")?;
    fs::write(&args.initial, initial.to_string())
        .with_context(|| format!("writing {}", args.initial.display()))?;
    fs::write(&args.goal, goal.to_string()).with_context(|| format!("writing {}", args.goal.display()))?;
    info!(
        "seed {seed}: wrote {} and {}",
        args.initial.display(),
        args.goal.display()
    );
    Ok(())
}
