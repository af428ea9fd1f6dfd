pub mod config;
pub mod console;
pub mod error;
pub mod session;
pub mod slots;

use anyhow::{Context, Result};
use dotenv::dotenv;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use std::env;
use std::io;
use std::path::Path;

use config::{MachineConfig, CONFIG_FILE};
use console::Console;
use slots::RandomReels;

fn reels_rng() -> Result<StdRng> {
    match env::var("SLOTS_SEED") {
        Ok(seed) => {
            let seed = seed
                .trim()
                .parse::<u64>()
                .with_context(|| format!("SLOTS_SEED must be a u64, got {:?}", seed))?;
            info!("seeding reels with {}", seed);
            Ok(StdRng::seed_from_u64(seed))
        }
        Err(_) => Ok(StdRng::from_entropy()),
    }
}

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let path = env::var("SLOTS_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
    let config = MachineConfig::load(&path)?;
    if !Path::new(&path).exists() {
        config.save(&path)?;
        info!("wrote default machine config to {}", path);
    }
    config
        .validate()
        .with_context(|| format!("invalid machine config in {}", path))?;

    let reels = RandomReels::new(reels_rng()?);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut console = Console::new(stdin.lock(), stdout.lock());
    let summary = console.run(config, reels)?;

    info!(
        "{} spins, {} wins, wagered ${}, won ${}, left with ${}",
        summary.spins, summary.wins, summary.total_wagered, summary.total_won, summary.final_balance
    );
    Ok(())
}
