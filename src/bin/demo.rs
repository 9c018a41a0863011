//! knapsack-demo: encrypt, decrypt and attack a Merkle-Hellman instance
//!
//! With no key material a random instance is generated. Otherwise `--u`,
//! `--v` and `--set` describe the private side and the public key is derived
//! from them.

use std::time::{Duration, Instant};

use clap::Parser;
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use knapsack_lll::attack::{ExhaustiveSearch, StructuralAttack};
use knapsack_lll::knapsack::{Knapsack, PrivateKey, SuperincreasingSet};
use knapsack_lll::params::{BlockSize, SearchConfig, SetParams};

#[derive(Parser)]
#[command(name = "knapsack-demo")]
#[command(about = "Merkle-Hellman knapsack encryption and its attacks")]
#[command(version)]
struct Args {
    /// Private modulus U
    #[arg(long, requires_all = ["v", "set"])]
    u: Option<u64>,

    /// Private multiplier V, coprime to U
    #[arg(long, requires_all = ["u", "set"])]
    v: Option<u64>,

    /// Superincreasing set, comma separated (8 values per block byte)
    #[arg(long, value_delimiter = ',', requires_all = ["u", "v"])]
    set: Option<Vec<u64>>,

    /// Message to encrypt
    #[arg(long, default_value = "Hello World!")]
    data: String,

    /// Block size in bytes for a random instance
    #[arg(long, default_value = "8")]
    block_size: usize,

    /// Stop the exhaustive search after this many keys
    #[arg(long, default_value = "5")]
    max_keys: u64,

    /// Largest modulus U tried by the exhaustive search
    #[arg(long)]
    max_modulus: Option<u64>,

    /// Exhaustive search workers (defaults to available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Random seed for a deterministic instance (optional)
    #[arg(long)]
    seed: Option<u64>,

    /// Skip the exhaustive search
    #[arg(long)]
    skip_search: bool,

    /// Log at debug level
    #[arg(long)]
    verbose: bool,
}

fn build_knapsack(args: &Args) -> Result<Knapsack> {
    if let (Some(u), Some(v), Some(set)) = (args.u, args.v, args.set.as_ref()) {
        if set.len() % 8 != 0 {
            return Err(eyre::eyre!(
                "set has {} values, expected a multiple of 8",
                set.len()
            ));
        }
        let block_size = BlockSize::new(set.len() / 8)?;
        let set = SuperincreasingSet::from_u64(set).wrap_err("invalid set")?;
        let private = PrivateKey::from_u64(u, v).wrap_err("invalid u & v")?;
        return Knapsack::from_parts(block_size, &set, private).wrap_err("invalid key pair");
    }

    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let block_size = BlockSize::new(args.block_size)?;
    Knapsack::random(block_size, &SetParams::default(), &mut rng)
        .wrap_err("failed to generate a random instance")
}

fn spinner(message: &'static str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let knapsack = build_knapsack(&args)?;
    let data = args.data.as_bytes();

    println!("private key: {}", knapsack.private_key());
    println!("public key: {}", knapsack.public_key());
    println!("data: {:?} {}", data, args.data);

    println!("\nencrypting...");
    let cipher = knapsack.encrypt(data)?;
    println!("ciphertext: {}", cipher);

    println!("\ndecrypting...");
    let plain = knapsack.decrypt(&cipher)?;
    println!("plaintext: {:?} {}", plain, String::from_utf8_lossy(&plain));

    println!("\nrunning structural attack...");
    let pb = spinner("Reducing knapsack lattices...")?;
    let report = StructuralAttack::new(knapsack.block_size(), knapsack.public_key())?
        .run(&cipher, data);
    pb.finish_with_message(format!("Structural attack done in {:.2?}", report.elapsed));

    for block in &report.blocks {
        info!(
            "Block {}: {} candidate(s), {} LLL iterations, {} swaps",
            block.block_index,
            block.candidates.len(),
            block.stats.iterations,
            block.stats.swaps
        );
    }
    println!("matched (block, column): {:?}", report.matched_columns());
    match &report.recovered {
        Some(bytes) => println!("recovered: {}", String::from_utf8_lossy(bytes)),
        None => println!("recovered: incomplete"),
    }

    if args.skip_search {
        return Ok(());
    }

    println!("\n\nbrute forcing decryption...");
    let mut config = SearchConfig {
        max_keys: args.max_keys,
        ..SearchConfig::default()
    };
    if let Some(max_modulus) = args.max_modulus {
        config.max_modulus = max_modulus;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let started = Instant::now();
    let search = ExhaustiveSearch::new(
        cipher.clone(),
        knapsack.public_key().clone(),
        data.to_vec(),
        config,
    )
    .wrap_err("invalid search configuration")?;
    let mut handle = search.spawn();

    let pb = spinner("Searching private keys...")?;
    let mut found = 0u64;
    while let Some(key) = handle.next_match().await {
        found += 1;
        pb.println(format!("key {}: {} ({:.2?})", found, key, started.elapsed()));
        pb.set_message(format!("Searching private keys... {} found", found));
    }

    let outcome = handle.finish().await?;
    pb.finish_with_message(format!("Search stopped: {:?}", outcome.termination));

    println!();
    println!("=== Search Complete ===");
    println!("Keys found: {}", outcome.found());
    println!("Last modulus: {}", outcome.last_modulus);
    println!("Total time: {:.2?}", outcome.elapsed);

    Ok(())
}
