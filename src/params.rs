//! Parameter sets for the knapsack cryptosystem and its attacks
//!
//! Every tunable value is an explicit configuration struct passed by the
//! caller. Nothing here is global state.

use std::time::Duration;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::error::{KnapsackError, Result};

/// Largest supported block size in bytes
pub const MAX_BLOCK_SIZE: usize = 8;

/// Number of plaintext bytes packed into one knapsack block
///
/// The superincreasing set and the public key both have `8 × bytes` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct BlockSize(usize);

impl BlockSize {
    /// Validate and wrap a block size in bytes (1..=8)
    pub fn new(bytes: usize) -> Result<Self> {
        if bytes == 0 || bytes > MAX_BLOCK_SIZE {
            return Err(KnapsackError::InvalidBlockSize(bytes));
        }
        Ok(Self(bytes))
    }

    /// Block size in bytes
    #[inline]
    pub fn bytes(self) -> usize {
        self.0
    }

    /// Block size in bits, i.e. the knapsack length n
    #[inline]
    pub fn bits(self) -> usize {
        self.0 * 8
    }
}

impl TryFrom<usize> for BlockSize {
    type Error = KnapsackError;

    fn try_from(bytes: usize) -> Result<Self> {
        Self::new(bytes)
    }
}

impl From<BlockSize> for usize {
    fn from(size: BlockSize) -> usize {
        size.0
    }
}

/// Random superincreasing set generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetParams {
    /// Each element is `sum(previous) + r` with `r` uniform in `[2, max_gap + 2)`
    pub max_gap: u64,
}

impl SetParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_gap == 0 {
            return Err(KnapsackError::InvalidParameters(
                "max_gap must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SetParams {
    fn default() -> Self {
        Self { max_gap: 8 }
    }
}

/// LLL reduction parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LllParams {
    /// Lovász constant δ, conventionally 3/4
    pub delta: BigRational,

    /// Upper bound on reduce-then-swap passes
    pub max_iterations: usize,
}

impl LllParams {
    pub fn new(delta: BigRational, max_iterations: usize) -> Self {
        Self {
            delta,
            max_iterations,
        }
    }

    /// Check `1/4 < δ ≤ 1` and a non-zero iteration cap
    pub fn validate(&self) -> Result<()> {
        let quarter = BigRational::new(BigInt::one(), BigInt::from(4));
        if self.delta <= quarter || self.delta > BigRational::one() {
            return Err(KnapsackError::InvalidParameters(format!(
                "delta must be in (1/4, 1], got {}",
                self.delta
            )));
        }
        if self.max_iterations == 0 {
            return Err(KnapsackError::InvalidParameters(
                "max_iterations must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for LllParams {
    fn default() -> Self {
        Self {
            delta: BigRational::new(BigInt::from(3), BigInt::from(4)),
            max_iterations: 1000,
        }
    }
}

/// Exhaustive private-key search configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Stop after this many matching keys
    pub max_keys: u64,

    /// First modulus U handed to a worker
    pub start_modulus: u64,

    /// Last modulus U (inclusive)
    pub max_modulus: u64,

    /// Number of concurrent workers, each owning one U at a time
    pub workers: usize,

    /// How often the progress task logs the current U and throughput
    pub progress_interval: Duration,
}

impl SearchConfig {
    /// Default configuration with a bounded modulus range
    pub fn bounded(start_modulus: u64, max_modulus: u64, max_keys: u64) -> Self {
        Self {
            max_keys,
            start_modulus,
            max_modulus,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_keys == 0 {
            return Err(KnapsackError::InvalidParameters(
                "max_keys must be positive".into(),
            ));
        }
        if self.workers == 0 {
            return Err(KnapsackError::InvalidParameters(
                "workers must be positive".into(),
            ));
        }
        if self.start_modulus > self.max_modulus {
            return Err(KnapsackError::InvalidParameters(format!(
                "start_modulus {} exceeds max_modulus {}",
                self.start_modulus, self.max_modulus
            )));
        }
        if self.progress_interval.is_zero() {
            return Err(KnapsackError::InvalidParameters(
                "progress_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            max_keys: 5,
            start_modulus: 1,
            max_modulus: u64::MAX,
            workers,
            progress_interval: Duration::from_secs(3),
        }
    }
}
