//! Exact rational vectors and matrices
//!
//! Entries are `BigRational`, which keeps every value in lowest terms after
//! each operation, so equality is exact and no precision is ever lost during
//! reduction. Matrices are stored row-major (`m[row][col]`); lattice bases use
//! the columns as basis vectors.

use std::fmt;
use std::ops::Index;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::error::{KnapsackError, Result};

#[inline]
fn check_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(KnapsackError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// A vector of exact rationals, always an independent copy of its source
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector(Vec<BigRational>);

impl Vector {
    pub fn new(entries: Vec<BigRational>) -> Self {
        Self(entries)
    }

    pub fn zeros(len: usize) -> Self {
        Self(vec![BigRational::zero(); len])
    }

    pub fn from_integers(entries: &[i64]) -> Self {
        Self(
            entries
                .iter()
                .map(|&v| BigRational::from_integer(BigInt::from(v)))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BigRational> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[BigRational] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<BigRational> {
        self.0
    }

    /// Element-wise `self + other`
    pub fn add(&self, other: &Vector) -> Result<Vector> {
        check_len(self.len(), other.len())?;
        Ok(Self(
            self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect(),
        ))
    }

    /// Element-wise `self - other`
    pub fn sub(&self, other: &Vector) -> Result<Vector> {
        check_len(self.len(), other.len())?;
        Ok(Self(
            self.0.iter().zip(&other.0).map(|(a, b)| a - b).collect(),
        ))
    }

    /// `k · self` for a rational scalar
    pub fn scale(&self, k: &BigRational) -> Vector {
        Self(self.0.iter().map(|a| a * k).collect())
    }

    /// `k · self` for an integer scalar
    pub fn scale_int(&self, k: &BigInt) -> Vector {
        self.scale(&BigRational::from_integer(k.clone()))
    }

    /// `self - k · other`, the update used by projections and size reduction
    pub fn sub_scaled(&self, k: &BigRational, other: &Vector) -> Result<Vector> {
        check_len(self.len(), other.len())?;
        Ok(Self(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| a - k * b)
                .collect(),
        ))
    }

    /// Inner product ⟨self, other⟩
    pub fn dot(&self, other: &Vector) -> Result<BigRational> {
        check_len(self.len(), other.len())?;
        Ok(self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum())
    }

    /// ‖self‖²
    pub fn norm_squared(&self) -> BigRational {
        self.0.iter().map(|a| a * a).sum()
    }

    /// True when every entry has denominator one
    pub fn is_integral(&self) -> bool {
        self.0.iter().all(|a| a.is_integer())
    }
}

impl Index<usize> for Vector {
    type Output = BigRational;

    fn index(&self, i: usize) -> &BigRational {
        &self.0[i]
    }
}

impl From<Vec<BigRational>> for Vector {
    fn from(entries: Vec<BigRational>) -> Self {
        Self(entries)
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

/// A rectangular grid of exact rationals addressed by `(row, col)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<BigRational>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![vec![BigRational::zero(); cols]; rows],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i][i] = BigRational::one();
        }
        m
    }

    /// Build from rows, rejecting ragged input
    pub fn from_rows(rows: Vec<Vec<BigRational>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        for row in &rows {
            check_len(cols, row.len())?;
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows,
        })
    }

    pub fn from_integer_rows(rows: &[Vec<i64>]) -> Result<Self> {
        Self::from_rows(
            rows.iter()
                .map(|r| Vector::from_integers(r).into_inner())
                .collect(),
        )
    }

    /// Build a square basis whose columns are the given vectors
    pub fn from_columns(columns: &[Vector]) -> Result<Self> {
        let rows = columns.first().map_or(0, Vector::len);
        let mut m = Self::zeros(rows, columns.len());
        for (c, column) in columns.iter().enumerate() {
            m.set_col(c, column)?;
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> &BigRational {
        &self.data[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: BigRational) {
        self.data[row][col] = value;
    }

    /// Copy of row `r`
    pub fn row(&self, r: usize) -> Vector {
        Vector(self.data[r].clone())
    }

    /// Copy of column `c`
    pub fn col(&self, c: usize) -> Vector {
        Vector(self.data.iter().map(|row| row[c].clone()).collect())
    }

    pub fn set_row(&mut self, r: usize, v: &Vector) -> Result<()> {
        check_len(self.cols, v.len())?;
        self.data[r].clone_from_slice(v.as_slice());
        Ok(())
    }

    pub fn set_col(&mut self, c: usize, v: &Vector) -> Result<()> {
        check_len(self.rows, v.len())?;
        for (row, value) in self.data.iter_mut().zip(v.iter()) {
            row[c] = value.clone();
        }
        Ok(())
    }

    pub fn swap_cols(&mut self, a: usize, b: usize) {
        for row in &mut self.data {
            row.swap(a, b);
        }
    }

    pub fn columns(&self) -> Vec<Vector> {
        (0..self.cols).map(|c| self.col(c)).collect()
    }

    pub fn to_rows(&self) -> Vec<Vec<BigRational>> {
        self.data.clone()
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.data.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, "\t")?;
                }
                write!(f, "{}", v)?;
            }
            if r + 1 < self.rows {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
