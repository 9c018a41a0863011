//! Attacks that recover plaintext or working private keys from public data
//!
//! # Attacks
//!
//! 1. **Structural**: build the knapsack lattice for each ciphertext block,
//!    LLL-reduce it and read plaintext bits off any column of the form
//!    (0/1, .., 0/1, 0). Needs only the public key and the ciphertext.
//! 2. **Exhaustive**: enumerate private keys (U, V) and keep the ones that
//!    decrypt the ciphertext to the expected plaintext. Concurrent, bounded,
//!    cancellable.
//!
//! # Example
//!
//! ```
//! use knapsack_lll::attack::run_structural_attack;
//! use knapsack_lll::knapsack::{encode, encrypt, PublicKey};
//! use knapsack_lll::params::BlockSize;
//!
//! let public = PublicKey::from_u64(&[39, 65, 117, 234, 494, 303, 671, 670]).unwrap();
//! let block_size = BlockSize::new(1).unwrap();
//! let cipher = encrypt(&encode(b"B", block_size), &public).unwrap();
//!
//! let report = run_structural_attack(block_size, &cipher, &public, b"B").unwrap();
//! assert_eq!(report.recovered.as_deref(), Some(&b"B"[..]));
//! ```

mod exhaustive;
mod structural;

pub use exhaustive::{CancelToken, ExhaustiveSearch, SearchHandle, SearchOutcome, Termination};
pub use structural::{
    run_structural_attack, BlockReport, Candidate, StructuralAttack, StructuralReport,
};
