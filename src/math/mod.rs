//! Arbitrary-precision number theory used by the knapsack cryptosystem.
//!
//! All key material and ciphertext values are `BigUint`, so block sizes up to
//! eight bytes (and the products formed while unwrapping the trapdoor) never
//! overflow a machine word.
//!
//! # Example
//!
//! ```
//! use knapsack_lll::math::{eea, mod_inverse};
//! use num_bigint::BigUint;
//!
//! let inv = mod_inverse(&BigUint::from(13u32), &BigUint::from(672u32)).unwrap();
//! assert_eq!(inv, BigUint::from(517u32));
//! assert_eq!(eea(&BigUint::from(13u32), &BigUint::from(672u32)), inv);
//! ```

pub mod modular;

pub use modular::{eea, gcd, is_coprime, mod_inverse, mul_mod};
