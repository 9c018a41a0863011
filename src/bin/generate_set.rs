//! generate-set: print a random superincreasing set

use clap::Parser;
use eyre::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use knapsack_lll::knapsack::{is_superincreasing, SuperincreasingSet};
use knapsack_lll::params::{BlockSize, SetParams};

#[derive(Parser)]
#[command(name = "generate-set")]
#[command(about = "Generate a random superincreasing set")]
#[command(version)]
struct Args {
    /// Block size in bytes (1-8); the set has 8 values per byte
    block_size: usize,

    /// Upper bound on the random increment added to each running sum
    #[arg(long, default_value = "8")]
    max_gap: u64,

    /// Random seed (optional)
    #[arg(long)]
    seed: Option<u64>,

    /// Print the set as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let block_size = BlockSize::new(args.block_size)
        .wrap_err_with(|| format!("argument is not a valid block size: {}", args.block_size))?;
    let params = SetParams {
        max_gap: args.max_gap,
    };

    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let set = SuperincreasingSet::random(block_size, &params, &mut rng)?;
    if let Some(max) = set.max() {
        debug!("Generated set with max element {}", max);
    }

    if args.json {
        println!("{}", serde_json::to_string(&set)?);
        return Ok(());
    }

    println!("Superincreasing?: {}", is_superincreasing(set.as_slice()));
    println!("size: {}", set.len());
    println!("{}", set);

    Ok(())
}
