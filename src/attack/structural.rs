//! Structural attack: recover plaintext bits from lattice geometry
//!
//! For a block ciphertext c under public key a_0..a_{n-1}, the columns of
//!
//! ```text
//! | 1   0   ...  0    0 |
//! | 0   1   ...  0    0 |
//! | ...               . |
//! | 0   0   ...  1    0 |
//! | a_0 a_1 ... a_{n-1} -c |
//! ```
//!
//! span a lattice containing (m_0, .., m_{n-1}, 0) for the plaintext bits m.
//! That vector is very short, so LLL tends to surface it as a basis column.
//! The trapdoor is never touched.

use std::time::{Duration, Instant};

use num_bigint::{BigInt, BigUint, Sign};
use num_rational::BigRational;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{KnapsackError, Result};
use crate::knapsack::{decode, Ciphertext, Plaintext, PublicKey};
use crate::lattice::{lll_reduce, LllStats, Matrix, Vector};
use crate::params::{BlockSize, LllParams};

/// A reduced-basis column with the plaintext signature
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Column index in the reduced basis
    pub column: usize,

    /// Block value read from the 0/1 entries, most significant bit first
    pub block: u64,

    /// Decoded block bytes
    pub bytes: Vec<u8>,

    /// Whether `bytes` equals the expected plaintext for this block
    pub matches: bool,
}

/// Attack result for one ciphertext block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockReport {
    pub block_index: usize,

    pub candidates: Vec<Candidate>,

    /// Reduction statistics; default when the lattice could not be reduced
    pub stats: LllStats,

    /// Reduced (or partially reduced) basis, when reduction ran
    pub reduced_basis: Option<Matrix>,

    /// Why this block produced no candidate
    pub failure: Option<KnapsackError>,
}

impl BlockReport {
    fn failed(block_index: usize, failure: KnapsackError) -> Self {
        Self {
            block_index,
            candidates: Vec::new(),
            stats: LllStats::default(),
            reduced_basis: None,
            failure: Some(failure),
        }
    }

    /// First candidate that decodes to the expected bytes
    pub fn matched(&self) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.matches)
    }
}

/// Attack result for a whole ciphertext
#[derive(Clone, Debug)]
pub struct StructuralReport {
    pub blocks: Vec<BlockReport>,

    /// Full plaintext when every block had a matching candidate
    pub recovered: Option<Vec<u8>>,

    pub elapsed: Duration,
}

impl StructuralReport {
    /// True when at least one candidate matched the expected plaintext
    pub fn found(&self) -> bool {
        self.blocks.iter().any(|b| b.matched().is_some())
    }

    /// `(block index, column)` of every matching candidate
    pub fn matched_columns(&self) -> Vec<(usize, usize)> {
        self.blocks
            .iter()
            .flat_map(|b| {
                b.candidates
                    .iter()
                    .filter(|c| c.matches)
                    .map(move |c| (b.block_index, c.column))
            })
            .collect()
    }

    /// The recovered plaintext, or the first block failure
    pub fn into_result(self) -> Result<Vec<u8>> {
        if let Some(data) = self.recovered {
            return Ok(data);
        }
        let failure = self
            .blocks
            .into_iter()
            .find_map(|b| b.failure)
            .unwrap_or(KnapsackError::NoCandidateFound);
        Err(failure)
    }
}

/// Lattice attack against one public key
pub struct StructuralAttack<'a> {
    block_size: BlockSize,
    public: &'a PublicKey,
    params: LllParams,
}

impl<'a> StructuralAttack<'a> {
    pub fn new(block_size: BlockSize, public: &'a PublicKey) -> Result<Self> {
        if public.len() != block_size.bits() {
            return Err(KnapsackError::DimensionMismatch {
                expected: block_size.bits(),
                actual: public.len(),
            });
        }
        Ok(Self {
            block_size,
            public,
            params: LllParams::default(),
        })
    }

    pub fn with_params(mut self, params: LllParams) -> Self {
        self.params = params;
        self
    }

    /// (n+1)×(n+1) basis: identity top-left, public key along the bottom
    /// row, −c in the bottom-right corner
    pub fn knapsack_basis(&self, value: &BigUint) -> Matrix {
        let n = self.public.len();
        let mut basis = Matrix::identity(n + 1);

        for (i, a) in self.public.iter().enumerate() {
            basis.set(n, i, to_rational(a));
        }
        basis.set(n, n, -to_rational(value));
        basis
    }

    /// Reduce the lattice for one block value and collect candidates.
    ///
    /// `expected` is the plaintext chunk this block should decode to; an
    /// empty chunk lists candidates without matching any of them.
    pub fn attack_block(
        &self,
        block_index: usize,
        value: &BigUint,
        expected: &[u8],
    ) -> Result<BlockReport> {
        let basis = self.knapsack_basis(value);
        debug!("Block {} initial basis:\n{}", block_index, basis);

        let outcome = lll_reduce(basis, &self.params)?;
        debug!("Block {} reduced basis:\n{}", block_index, outcome.basis);

        if !outcome.converged {
            return Ok(BlockReport {
                block_index,
                candidates: Vec::new(),
                stats: outcome.stats,
                failure: Some(KnapsackError::ReductionDidNotConverge {
                    iterations: outcome.stats.iterations,
                }),
                reduced_basis: Some(outcome.basis),
            });
        }

        let mut candidates = Vec::new();
        for column in 0..outcome.basis.cols() {
            let Some(block) = plaintext_bits(&outcome.basis.col(column)) else {
                continue;
            };

            let width = self.block_size.bytes();
            let mut bytes = decode(&Plaintext::from_blocks(self.block_size, vec![block], width));
            let matches = block_matches(&bytes, expected);
            if !expected.is_empty() {
                bytes.truncate(expected.len());
            }

            if matches {
                info!(
                    "Block {}: column {} decodes to the expected plaintext",
                    block_index, column
                );
            } else {
                info!(
                    "Block {}: column {} has the plaintext signature but decodes to {:?}",
                    block_index, column, bytes
                );
            }

            candidates.push(Candidate {
                column,
                block,
                bytes,
                matches,
            });
        }

        let failure = if candidates.is_empty() {
            warn!("Block {}: no plaintext-shaped column in reduced basis", block_index);
            Some(KnapsackError::NoCandidateFound)
        } else {
            None
        };

        Ok(BlockReport {
            block_index,
            candidates,
            stats: outcome.stats,
            reduced_basis: Some(outcome.basis),
            failure,
        })
    }

    /// Attack every block of `cipher` in turn.
    ///
    /// Errors inside one block's reduction are recorded on that block's
    /// report and never abort the remaining blocks.
    pub fn run(&self, cipher: &Ciphertext, expected: &[u8]) -> StructuralReport {
        let started = Instant::now();
        let width = self.block_size.bytes();

        let blocks: Vec<BlockReport> = cipher
            .blocks()
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let chunk = expected
                    .get(index * width..)
                    .map(|rest| &rest[..rest.len().min(width)])
                    .unwrap_or(&[]);

                self.attack_block(index, value, chunk)
                    .unwrap_or_else(|err| {
                        warn!("Block {}: lattice attack failed: {}", index, err);
                        BlockReport::failed(index, err)
                    })
            })
            .collect();

        let recovered = if blocks.is_empty() {
            None
        } else {
            blocks
                .iter()
                .map(|b| b.matched().map(|c| c.bytes.clone()))
                .collect::<Option<Vec<_>>>()
                .map(|parts| parts.concat())
        };

        let report = StructuralReport {
            blocks,
            recovered,
            elapsed: started.elapsed(),
        };
        info!(
            "Structural attack finished in {:.2?}: found={} matched={:?}",
            report.elapsed,
            report.found(),
            report.matched_columns()
        );
        report
    }
}

fn to_rational(value: &BigUint) -> BigRational {
    BigRational::from_integer(BigInt::from_biguint(Sign::Plus, value.clone()))
}

/// Read a block from a column whose first n entries are 0/1 and whose last
/// entry is 0; `None` for any other column
fn plaintext_bits(column: &Vector) -> Option<u64> {
    let (last, bits) = column.as_slice().split_last()?;
    if !last.is_zero() || bits.len() > 64 {
        return None;
    }

    let n = bits.len();
    let mut block = 0u64;
    for (i, entry) in bits.iter().enumerate() {
        if entry.is_one() {
            block |= 1u64 << (n - 1 - i);
        } else if !entry.is_zero() {
            return None;
        }
    }
    Some(block)
}

/// A full-width block matches a chunk when it equals the chunk followed only
/// by zero padding
fn block_matches(block: &[u8], expected: &[u8]) -> bool {
    if expected.is_empty() || expected.len() > block.len() {
        return false;
    }
    let (head, padding) = block.split_at(expected.len());
    head == expected && padding.iter().all(|&b| b == 0)
}

/// Run the structural attack with default LLL parameters
pub fn run_structural_attack(
    block_size: BlockSize,
    cipher: &Ciphertext,
    public: &PublicKey,
    expected: &[u8],
) -> Result<StructuralReport> {
    Ok(StructuralAttack::new(block_size, public)?.run(cipher, expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knapsack::{encode, encrypt, PrivateKey, SuperincreasingSet};

    fn one_byte() -> BlockSize {
        BlockSize::new(1).unwrap()
    }

    fn bat_public() -> PublicKey {
        PublicKey::from_u64(&[39, 65, 117, 234, 494, 303, 671, 670]).unwrap()
    }

    #[test]
    fn test_knapsack_basis_layout() {
        let public = bat_public();
        let attack = StructuralAttack::new(one_byte(), &public).unwrap();
        let basis = attack.knapsack_basis(&BigUint::from(736u32));

        assert_eq!(basis.rows(), 9);
        assert_eq!(basis.cols(), 9);
        assert_eq!(*basis.get(0, 0), BigRational::one());
        assert_eq!(*basis.get(0, 1), BigRational::zero());
        assert_eq!(*basis.get(8, 3), to_rational(&BigUint::from(234u32)));
        assert_eq!(*basis.get(8, 8), -to_rational(&BigUint::from(736u32)));
        assert_eq!(*basis.get(3, 8), BigRational::zero());
    }

    #[test]
    fn test_plaintext_bits_signature() {
        let col = Vector::from_integers(&[0, 1, 0, 0, 0, 0, 1, 0, 0]);
        assert_eq!(plaintext_bits(&col), Some(0x42));

        let negated = Vector::from_integers(&[0, -1, 0, 0, 0, 0, -1, 0, 0]);
        assert_eq!(plaintext_bits(&negated), None);

        let nonzero_tail = Vector::from_integers(&[0, 1, 0, 1]);
        assert_eq!(plaintext_bits(&nonzero_tail), None);
    }

    #[test]
    fn test_block_match_requires_zero_padding() {
        assert!(block_matches(&[0x42, 0x61], &[0x42, 0x61]));
        assert!(block_matches(&[0x42, 0x00], &[0x42]));
        assert!(!block_matches(&[0x42, 0x61], &[0x42]));
        assert!(!block_matches(&[0x42], &[]));
        assert!(!block_matches(&[0x42], &[0x42, 0x00]));
    }

    #[test]
    fn test_recovers_single_block() {
        let public = bat_public();
        let cipher = encrypt(&encode(b"B", one_byte()), &public).unwrap();
        assert_eq!(cipher.blocks(), &[BigUint::from(736u32)]);

        let report = run_structural_attack(one_byte(), &cipher, &public, b"B").unwrap();
        assert!(report.found());
        assert_eq!(report.matched_columns(), vec![(0, 0)]);
        assert_eq!(report.recovered.as_deref(), Some(&b"B"[..]));
    }

    #[test]
    fn test_wikipedia_instance() {
        let set = SuperincreasingSet::from_u64(&[2, 7, 11, 21, 42, 89, 180, 354]).unwrap();
        let private = PrivateKey::from_u64(881, 588).unwrap();
        let public = PublicKey::derive(&set, &private).unwrap();
        let cipher = encrypt(&encode(b"a", one_byte()), &public).unwrap();

        let report = run_structural_attack(one_byte(), &cipher, &public, b"a").unwrap();
        assert!(report.found());
        assert_eq!(report.into_result().unwrap(), b"a");
    }

    #[test]
    fn test_no_candidate_is_reported_not_raised() {
        let public = bat_public();
        let cipher = encrypt(&encode(b"t", one_byte()), &public).unwrap();

        let report = run_structural_attack(one_byte(), &cipher, &public, b"t").unwrap();
        assert!(!report.found());
        assert_eq!(report.blocks[0].failure, Some(KnapsackError::NoCandidateFound));
        assert!(report.blocks[0].reduced_basis.is_some());
        assert_eq!(report.into_result(), Err(KnapsackError::NoCandidateFound));
    }

    #[test]
    fn test_multi_block_partial_recovery() {
        let public = bat_public();
        let cipher = encrypt(&encode(b"Bat", one_byte()), &public).unwrap();

        let report = run_structural_attack(one_byte(), &cipher, &public, b"Bat").unwrap();
        assert_eq!(report.blocks.len(), 3);
        assert!(report.found());
        assert!(report.blocks[0].matched().is_some());
        assert!(report.blocks[1].matched().is_some());
        assert!(report.blocks[2].matched().is_none());
        assert!(report.recovered.is_none());
    }

    #[test]
    fn test_iteration_cap_is_a_block_failure() {
        let public = bat_public();
        let cipher = Ciphertext::from_u64(&[736], one_byte());
        let params = LllParams::new(LllParams::default().delta, 1);

        let attack = StructuralAttack::new(one_byte(), &public)
            .unwrap()
            .with_params(params);
        let report = attack.run(&cipher, b"B");

        assert!(!report.found());
        assert!(matches!(
            report.blocks[0].failure,
            Some(KnapsackError::ReductionDidNotConverge { iterations: 1 })
        ));
    }

    #[test]
    fn test_rejects_mismatched_public_key() {
        let public = bat_public();
        assert!(StructuralAttack::new(BlockSize::new(2).unwrap(), &public).is_err());
    }
}
