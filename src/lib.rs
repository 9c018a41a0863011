//! Knapsack-LLL: the Merkle-Hellman knapsack cryptosystem and two attacks on it
//!
//! The cryptosystem hides a superincreasing subset-sum instance behind a
//! modular multiplication. Both attacks get at the plaintext without the
//! generating key.
//!
//! Key components:
//! - Knapsack: key generation, block codec, encryption and trapdoor decryption
//! - Lattice: exact rational Gram-Schmidt and LLL reduction
//! - Structural attack: LLL on the knapsack lattice exposes the plaintext bits
//! - Exhaustive search: concurrent enumeration of working private keys

pub mod params;
pub mod error;
pub mod math;
pub mod lattice;
pub mod knapsack;
pub mod attack;

pub use attack::{
    run_structural_attack,
    ExhaustiveSearch, SearchHandle, SearchOutcome, Termination,
    StructuralAttack, StructuralReport,
};
pub use error::{KnapsackError, Result};
pub use knapsack::{
    decode, decrypt, encode, encrypt,
    Ciphertext, Knapsack, Plaintext, PrivateKey, PublicKey, SuperincreasingSet,
};
pub use lattice::{lll_reduce, LllOutcome, Matrix};

pub use params::{BlockSize, LllParams, SearchConfig, SetParams};
