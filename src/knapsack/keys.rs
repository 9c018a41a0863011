//! Key material: the superincreasing set, the private trapdoor and the public key

use std::fmt;

use num_bigint::{BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid_key, KnapsackError, Result};
use crate::math::{is_coprime, mod_inverse, mul_mod};
use crate::params::{BlockSize, SetParams};

/// Check that every element strictly exceeds the sum of all previous ones.
///
/// The first element must be positive. An empty slice is not superincreasing.
pub fn is_superincreasing(values: &[BigUint]) -> bool {
    let Some((first, rest)) = values.split_first() else {
        return false;
    };
    if first.is_zero() {
        return false;
    }

    let mut sum = first.clone();
    for v in rest {
        if v <= &sum {
            return false;
        }
        sum += v;
    }
    true
}

fn join_values(f: &mut fmt::Formatter<'_>, values: &[BigUint]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    Ok(())
}

/// Secret superincreasing sequence S of length `8 × block size`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BigUint>", into = "Vec<BigUint>")]
pub struct SuperincreasingSet(Vec<BigUint>);

impl SuperincreasingSet {
    pub fn new(values: Vec<BigUint>) -> Result<Self> {
        if !is_superincreasing(&values) {
            return Err(invalid_key!("set is not superincreasing"));
        }
        Ok(Self(values))
    }

    pub fn from_u64(values: &[u64]) -> Result<Self> {
        Self::new(values.iter().copied().map(BigUint::from).collect())
    }

    /// Random set of `block_size.bits()` elements.
    ///
    /// Starts from r ∈ [2, max_gap + 2) and grows each step by the running
    /// sum plus a fresh r, so the result is superincreasing by construction.
    pub fn random<R: Rng + ?Sized>(
        block_size: BlockSize,
        params: &SetParams,
        rng: &mut R,
    ) -> Result<Self> {
        params.validate()?;
        let size = block_size.bits();
        let upper = params.max_gap.saturating_add(2);

        let mut values = Vec::with_capacity(size);
        let mut sum = BigUint::zero();
        for _ in 0..size {
            let r = BigUint::from(rng.gen_range(2..upper));
            let next = &sum + r;
            sum += &next;
            values.push(next);
        }

        debug!("Generated superincreasing set of {} elements", size);
        Ok(Self(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Largest element, S[n-1]
    pub fn max(&self) -> Option<&BigUint> {
        self.0.last()
    }

    pub fn as_slice(&self) -> &[BigUint] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BigUint> {
        self.0.iter()
    }
}

impl TryFrom<Vec<BigUint>> for SuperincreasingSet {
    type Error = KnapsackError;

    fn try_from(values: Vec<BigUint>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<SuperincreasingSet> for Vec<BigUint> {
    fn from(set: SuperincreasingSet) -> Self {
        set.0
    }
}

impl fmt::Display for SuperincreasingSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_values(f, &self.0)
    }
}

/// Private trapdoor (U, V): V is the multiplier, U the modulus
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrivateKey {
    u: BigUint,
    v: BigUint,
}

impl PrivateKey {
    /// Validate `gcd(U, V) = 1` and `U > 0`
    pub fn new(u: BigUint, v: BigUint) -> Result<Self> {
        if u.is_zero() {
            return Err(invalid_key!("modulus U must be positive"));
        }
        if !is_coprime(&u, &v) {
            return Err(invalid_key!("GCD({}, {}) != 1", u, v));
        }
        Ok(Self { u, v })
    }

    pub fn from_u64(u: u64, v: u64) -> Result<Self> {
        Self::new(BigUint::from(u), BigUint::from(v))
    }

    /// Candidate key that skips validation; decryption reports bad candidates
    pub(crate) fn candidate(u: BigUint, v: BigUint) -> Self {
        Self { u, v }
    }

    /// Random key for `set`: U ∈ (2·max(S), 10·max(S)), V ∈ [1, 10·max(S)) coprime to U
    pub fn random<R: Rng + ?Sized>(set: &SuperincreasingSet, rng: &mut R) -> Result<Self> {
        let Some(max) = set.max() else {
            return Err(invalid_key!("set must be non-empty"));
        };
        let upper = max * 10u32;
        let u_min = max * 2u32 + 1u32;

        let u = rng.gen_biguint_range(&u_min, &upper);
        let v = loop {
            let v = rng.gen_biguint_range(&BigUint::one(), &upper);
            if is_coprime(&u, &v) {
                break v;
            }
        };

        debug!("Generated private key u={} v={}", u, v);
        Ok(Self { u, v })
    }

    /// Modulus U
    pub fn u(&self) -> &BigUint {
        &self.u
    }

    /// Multiplier V
    pub fn v(&self) -> &BigUint {
        &self.v
    }

    /// W = V⁻¹ mod U, the multiplier that unwraps the public key
    pub fn inverse_multiplier(&self) -> Result<BigUint> {
        if self.u.is_zero() {
            return Err(invalid_key!("modulus U is zero"));
        }
        mod_inverse(&self.v, &self.u)
    }
}

impl fmt::Display for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u={} v={}", self.u, self.v)
    }
}

/// Public key, PublicKey[i] = (V · S[i]) mod U
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BigUint>", into = "Vec<BigUint>")]
pub struct PublicKey(Vec<BigUint>);

impl PublicKey {
    /// Derive from the secret set, rejecting `U ≤ 2·max(S)`
    pub fn derive(set: &SuperincreasingSet, private: &PrivateKey) -> Result<Self> {
        let Some(max) = set.max() else {
            return Err(invalid_key!("set must be non-empty"));
        };
        let bound = max * 2u32;
        if private.u() <= &bound {
            return Err(invalid_key!(
                "U={} must exceed 2*max(S)={}",
                private.u(),
                bound
            ));
        }

        Ok(Self(
            set.iter()
                .map(|s| mul_mod(private.v(), s, private.u()))
                .collect(),
        ))
    }

    /// Wrap published values, e.g. ones received from another party
    pub fn from_values(values: Vec<BigUint>) -> Result<Self> {
        if values.is_empty() {
            return Err(invalid_key!("public key must be non-empty"));
        }
        Ok(Self(values))
    }

    pub fn from_u64(values: &[u64]) -> Result<Self> {
        Self::from_values(values.iter().copied().map(BigUint::from).collect())
    }

    /// Block size implied by the key length
    pub fn block_size(&self) -> Result<BlockSize> {
        if self.0.len() % 8 != 0 {
            return Err(KnapsackError::InvalidBlockSize(self.0.len()));
        }
        BlockSize::new(self.0.len() / 8)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[BigUint] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BigUint> {
        self.0.iter()
    }
}

impl TryFrom<Vec<BigUint>> for PublicKey {
    type Error = KnapsackError;

    fn try_from(values: Vec<BigUint>) -> Result<Self> {
        Self::from_values(values)
    }
}

impl From<PublicKey> for Vec<BigUint> {
    fn from(key: PublicKey) -> Self {
        key.0
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        join_values(f, &self.0)
    }
}
