//! Modular arithmetic over arbitrary-precision integers

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

use crate::error::{KnapsackError, Result};

/// Greatest common divisor
#[inline]
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

/// Check `gcd(a, b) = 1`
#[inline]
pub fn is_coprime(a: &BigUint, b: &BigUint) -> bool {
    gcd(a, b).is_one()
}

/// Extended Euclidean algorithm.
///
/// Returns the Bézout coefficient `x` of `a`, normalized into `[0, m)`, so that
/// `a·x ≡ gcd(a, m) (mod m)`. When `a` and `m` are coprime this is the
/// multiplicative inverse of `a`. Returns zero for `m = 0`.
pub fn eea(a: &BigUint, m: &BigUint) -> BigUint {
    if m.is_zero() {
        return BigUint::zero();
    }

    let modulus = BigInt::from_biguint(Sign::Plus, m.clone());
    let mut t = BigInt::zero();
    let mut new_t = BigInt::one();
    let mut r = modulus.clone();
    let mut new_r = BigInt::from_biguint(Sign::Plus, a.clone());

    while !new_r.is_zero() {
        let quotient = &r / &new_r;

        let next_t = &t - &quotient * &new_t;
        t = std::mem::replace(&mut new_t, next_t);

        let next_r = &r - &quotient * &new_r;
        r = std::mem::replace(&mut new_r, next_r);
    }

    while t.is_negative() {
        t += &modulus;
    }

    // t is non-negative here
    (t % &modulus).to_biguint().unwrap_or_default()
}

/// Multiplicative inverse of `a` modulo `m`.
///
/// Fails with `NoInverse` when `m = 0` or `gcd(a, m) ≠ 1`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint> {
    if m.is_zero() || !is_coprime(a, m) {
        return Err(KnapsackError::NoInverse {
            value: a.clone(),
            modulus: m.clone(),
        });
    }
    Ok(eea(a, m))
}

/// `(a · b) mod m`
#[inline]
pub fn mul_mod(a: &BigUint, b: &BigUint, m: &BigUint) -> BigUint {
    (a * b) % m
}
