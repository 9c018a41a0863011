//! Error handling for the knapsack cryptosystem and its attacks
//!
//! A single `KnapsackError` covers key construction, the rational matrix
//! kernel, decryption and both attacks. Outcomes that are not failures of
//! the caller (an exhausted search range, an unconverged reduction, a lattice
//! without a plaintext-shaped column) are reported as data by the attacks and
//! only become errors through their `into_result()` helpers.

use num_bigint::BigUint;
use thiserror::Error;

/// Knapsack operation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KnapsackError {
    /// Key material violates `gcd(U, V) = 1`, `U > 2·max(S)` or the superincreasing property
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid block size {0}: must be between 1 and 8 bytes")]
    InvalidBlockSize(usize),

    /// Vector or matrix operands of unequal length
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// `value` has no multiplicative inverse modulo `modulus`
    #[error("{value} has no inverse modulo {modulus}")]
    NoInverse { value: BigUint, modulus: BigUint },

    #[error("LLL reduction did not converge after {iterations} iterations")]
    ReductionDidNotConverge { iterations: usize },

    #[error("No column of the reduced basis has the plaintext signature")]
    NoCandidateFound,

    #[error("Search space exhausted after finding {found} key(s)")]
    SearchSpaceExhausted { found: u64 },

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Degenerate arithmetic, e.g. a zero-norm Gram-Schmidt vector
    #[error("Numeric failure: {0}")]
    Numeric(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Worker task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for KnapsackError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

/// Result type for knapsack operations
pub type Result<T> = std::result::Result<T, KnapsackError>;

/// Create a `KnapsackError::InvalidKey` with format string support
macro_rules! invalid_key {
    ($($arg:tt)*) => {
        $crate::error::KnapsackError::InvalidKey(format!($($arg)*))
    };
}

pub(crate) use invalid_key;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = KnapsackError::DimensionMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 3, got 2");

        let err = KnapsackError::NoInverse {
            value: BigUint::from(464u32),
            modulus: BigUint::from(902u32),
        };
        assert_eq!(err.to_string(), "464 has no inverse modulo 902");
    }

    #[test]
    fn test_invalid_key_macro() {
        let err = invalid_key!("GCD({}, {}) != 1", 4, 2);
        assert_eq!(err, KnapsackError::InvalidKey("GCD(4, 2) != 1".into()));
    }
}
