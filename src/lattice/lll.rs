//! LLL (Lenstra-Lenstra-Lovász) lattice basis reduction
//!
//! Exact rational arithmetic throughout. Floating-point Gram-Schmidt drifts
//! on the large entries of knapsack lattices and can stop at a basis that
//! hides the short plaintext vector, so no float path exists here.
//!
//! # Algorithm
//!
//! Each pass over the basis B (columns b_0..b_{n-1}):
//! 1. Compute Gram-Schmidt (X, μ) of B
//! 2. Size reduction: for j = 1..n, i = j-1 down to 0, if |μ[j][i]| > 1/2
//!    then b_j ← b_j − ⌊μ[j][i] + 1/2⌉·b_i
//! 3. Recompute (X, μ)
//! 4. Lovász check: on the first j with
//!    ‖x_{j+1} + μ[j+1][j]·x_j‖² < δ‖x_j‖², swap b_j and b_{j+1} and start a
//!    new pass
//! 5. Stop when a pass makes no swap, or when the iteration cap is reached
//!
//! # References
//!
//! - Lenstra, Lenstra, Lovász (1982)

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::gram_schmidt::{gram_schmidt, GramSchmidt};
use super::matrix::Matrix;
use crate::error::{KnapsackError, Result};
use crate::params::LllParams;

/// Statistics collected during reduction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LllStats {
    /// Completed reduce-then-swap passes
    pub iterations: usize,

    /// Number of basis column swaps
    pub swaps: usize,

    /// Number of size reduction steps b_j ← b_j − r·b_i
    pub size_reductions: usize,

    /// Number of Gram-Schmidt recomputations
    pub gso_updates: usize,
}

/// Result of running the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LllOutcome {
    /// Reduced basis, or the partially reduced one when not converged
    pub basis: Matrix,

    /// False when the iteration cap stopped the reduction
    pub converged: bool,

    pub stats: LllStats,
}

impl LllOutcome {
    /// Treat a missed fixed point as `ReductionDidNotConverge`
    pub fn into_result(self) -> Result<Matrix> {
        if self.converged {
            Ok(self.basis)
        } else {
            Err(KnapsackError::ReductionDidNotConverge {
                iterations: self.stats.iterations,
            })
        }
    }
}

/// LLL reducer over a square basis whose columns are the basis vectors
pub struct LllReducer {
    basis: Matrix,
    params: LllParams,
    stats: LllStats,
}

impl LllReducer {
    /// Create a reducer, validating the basis shape and parameters
    pub fn new(basis: Matrix, params: LllParams) -> Result<Self> {
        params.validate()?;
        if basis.cols() == 0 {
            return Err(KnapsackError::InvalidParameters(
                "basis must be non-empty".into(),
            ));
        }
        if !basis.is_square() {
            return Err(KnapsackError::DimensionMismatch {
                expected: basis.rows(),
                actual: basis.cols(),
            });
        }

        Ok(Self {
            basis,
            params,
            stats: LllStats::default(),
        })
    }

    /// Run reduction until no swap occurs or the iteration cap is hit.
    ///
    /// Errors only on degenerate input (linearly dependent columns);
    /// non-convergence is reported through `LllOutcome::converged`.
    pub fn reduce(mut self) -> Result<LllOutcome> {
        let n = self.basis.cols();

        while self.stats.iterations < self.params.max_iterations {
            self.stats.iterations += 1;

            let mut gs = self.orthogonalize()?;
            self.size_reduce(&mut gs)?;

            let gs = self.orthogonalize()?;
            if !self.lovasz_swap(&gs, n) {
                debug!(
                    "LLL converged: n={} iterations={} swaps={} size_reductions={}",
                    n, self.stats.iterations, self.stats.swaps, self.stats.size_reductions
                );
                return Ok(LllOutcome {
                    basis: self.basis,
                    converged: true,
                    stats: self.stats,
                });
            }
        }

        warn!(
            "LLL stopped at iteration cap {} without converging (n={})",
            self.params.max_iterations, n
        );
        Ok(LllOutcome {
            basis: self.basis,
            converged: false,
            stats: self.stats,
        })
    }

    fn orthogonalize(&mut self) -> Result<GramSchmidt> {
        self.stats.gso_updates += 1;
        gram_schmidt(&self.basis)
    }

    /// Bring every |μ[j][i]| down to at most 1/2.
    ///
    /// After b_j ← b_j − r·b_i the row μ[j][0..=i] is updated in place, which
    /// equals what a full recomputation would give for the new b_j.
    fn size_reduce(&mut self, gs: &mut GramSchmidt) -> Result<()> {
        let n = self.basis.cols();
        let half = BigRational::new(BigInt::one(), BigInt::from(2));

        for j in 1..n {
            for i in (0..j).rev() {
                let mu_ji = gs.mu(j, i).clone();
                if mu_ji.abs() <= half {
                    continue;
                }

                let r = round_half_up(&mu_ji, &half);
                let reduced = self.basis.col(j).sub_scaled(&r, &self.basis.col(i))?;
                self.basis.set_col(j, &reduced)?;

                for k in 0..i {
                    let updated = gs.mu(j, k) - &r * gs.mu(i, k);
                    gs.mu.set(j, k, updated);
                }
                gs.mu.set(j, i, mu_ji - &r);

                self.stats.size_reductions += 1;
            }
        }

        Ok(())
    }

    /// Swap the first pair violating the Lovász condition.
    ///
    /// x_j and x_{j+1} are orthogonal, so
    /// ‖x_{j+1} + μ·x_j‖² = ‖x_{j+1}‖² + μ²‖x_j‖² exactly.
    fn lovasz_swap(&mut self, gs: &GramSchmidt, n: usize) -> bool {
        for j in 0..n.saturating_sub(1) {
            let mu = gs.mu(j + 1, j);
            let left = &gs.norms_squared[j + 1] + mu * mu * &gs.norms_squared[j];
            let right = &self.params.delta * &gs.norms_squared[j];

            if left < right {
                self.basis.swap_cols(j, j + 1);
                self.stats.swaps += 1;
                return true;
            }
        }
        false
    }
}

/// ⌊x + 1/2⌋ as an integral rational
fn round_half_up(x: &BigRational, half: &BigRational) -> BigRational {
    (x + half).floor()
}

/// Reduce `basis` with the given parameters
pub fn lll_reduce(basis: Matrix, params: &LllParams) -> Result<LllOutcome> {
    LllReducer::new(basis, params.clone())?.reduce()
}
