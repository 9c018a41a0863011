//! Gram-Schmidt orthogonalization over the columns of a basis

use num_rational::BigRational;
use num_traits::Zero;

use super::matrix::{Matrix, Vector};
use crate::error::{KnapsackError, Result};

/// Orthogonalized basis together with its projection coefficients.
///
/// Only valid for the basis it was computed from; any change to the basis
/// requires a fresh computation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GramSchmidt {
    /// Orthogonal vectors x_0..x_{n-1}, stored as columns
    pub orthogonal: Matrix,

    /// μ[j][i] = ⟨x_i, b_j⟩ / ⟨x_i, x_i⟩ for i < j, zero elsewhere
    pub mu: Matrix,

    /// ‖x_i‖² for each orthogonal column
    pub norms_squared: Vec<BigRational>,
}

impl GramSchmidt {
    pub fn dimension(&self) -> usize {
        self.norms_squared.len()
    }

    /// μ[j][i]
    #[inline]
    pub fn mu(&self, j: usize, i: usize) -> &BigRational {
        self.mu.get(j, i)
    }

    /// Column x_i of the orthogonal basis
    pub fn x(&self, i: usize) -> Vector {
        self.orthogonal.col(i)
    }
}

/// Orthogonalize the columns of `basis`.
///
/// x_0 = b_0, and each later x_j starts as b_j with every earlier x_i
/// projection removed in turn. The input is not modified. Fails with
/// `Numeric` if a column is linearly dependent on the previous ones.
pub fn gram_schmidt(basis: &Matrix) -> Result<GramSchmidt> {
    let n = basis.cols();
    let mut orthogonal = Matrix::zeros(basis.rows(), n);
    let mut mu = Matrix::zeros(n, n);
    let mut norms_squared = Vec::with_capacity(n);
    let mut xs: Vec<Vector> = Vec::with_capacity(n);

    for j in 0..n {
        let b_j = basis.col(j);
        let mut x_j = b_j.clone();

        for (i, x_i) in xs.iter().enumerate() {
            let norm_sq: &BigRational = &norms_squared[i];
            let coefficient = x_i.dot(&b_j)? / norm_sq;
            x_j = x_j.sub_scaled(&coefficient, x_i)?;
            mu.set(j, i, coefficient);
        }

        let norm_sq = x_j.norm_squared();
        if norm_sq.is_zero() {
            return Err(KnapsackError::Numeric(format!(
                "basis column {} is linearly dependent",
                j
            )));
        }

        orthogonal.set_col(j, &x_j)?;
        norms_squared.push(norm_sq);
        xs.push(x_j);
    }

    Ok(GramSchmidt {
        orthogonal,
        mu,
        norms_squared,
    })
}
