//! Exact lattice basis reduction.
//!
//! - **Matrix kernel**: `Vector`/`Matrix` over `BigRational`, with dimension
//!   checks on every binary operation
//! - **Gram-Schmidt**: orthogonal columns plus the μ projection coefficients
//! - **LLL**: two-phase size-reduce / Lovász-swap reduction with an
//!   iteration cap
//!
//! Basis vectors are the matrix columns.
//!
//! # Example
//!
//! ```
//! use knapsack_lll::lattice::{lll_reduce, Matrix};
//! use knapsack_lll::params::LllParams;
//!
//! let basis = Matrix::from_integer_rows(&[vec![47, 95], vec![215, 460]]).unwrap();
//! let outcome = lll_reduce(basis, &LllParams::default()).unwrap();
//! assert!(outcome.converged);
//! assert_eq!(
//!     outcome.basis,
//!     Matrix::from_integer_rows(&[vec![1, 40], vec![30, 5]]).unwrap()
//! );
//! ```

pub mod gram_schmidt;
pub mod lll;
pub mod matrix;

pub use gram_schmidt::{gram_schmidt, GramSchmidt};
pub use lll::{lll_reduce, LllOutcome, LllReducer, LllStats};
pub use matrix::{Matrix, Vector};
