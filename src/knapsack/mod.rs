//! Merkle-Hellman knapsack cryptosystem.
//!
//! # Protocol Overview
//!
//! 1. **Keys**: pick a superincreasing set S, a modulus U > 2·max(S) and a
//!    multiplier V coprime to U; publish PublicKey[i] = V·S[i] mod U
//! 2. **Encrypt**: each block's bits select public-key entries to sum
//! 3. **Decrypt**: multiply by W = V⁻¹ mod U, which turns the sum back into a
//!    subset sum over S, then recover the bits greedily
//!
//! The cipher is intentionally broken; see `crate::attack`.
//!
//! # Example
//!
//! ```
//! use knapsack_lll::knapsack::{decode, decrypt, encode, encrypt, PrivateKey, PublicKey, SuperincreasingSet};
//! use knapsack_lll::params::BlockSize;
//!
//! let set = SuperincreasingSet::from_u64(&[3, 5, 9, 18, 38, 75, 155, 310]).unwrap();
//! let private = PrivateKey::from_u64(672, 13).unwrap();
//! let public = PublicKey::derive(&set, &private).unwrap();
//!
//! let block_size = BlockSize::new(1).unwrap();
//! let cipher = encrypt(&encode(b"Bat", block_size), &public).unwrap();
//! let plain = decrypt(&cipher, &private, &public).unwrap();
//! assert_eq!(decode(&plain), b"Bat");
//! ```

mod codec;
mod keys;

pub use codec::{decode, decrypt, encode, encrypt, encrypt_block, Ciphertext, Plaintext};
pub use keys::{is_superincreasing, PrivateKey, PublicKey, SuperincreasingSet};

use rand::Rng;
use tracing::info;

use crate::error::{invalid_key, Result};
use crate::params::{BlockSize, SetParams};

/// One cryptosystem instance. Keys are fixed at construction; a new key pair
/// means a new instance.
#[derive(Clone, Debug)]
pub struct Knapsack {
    block_size: BlockSize,
    private: PrivateKey,
    public: PublicKey,
}

impl Knapsack {
    /// Random instance: random superincreasing set, then a random trapdoor for it
    pub fn random<R: Rng + ?Sized>(
        block_size: BlockSize,
        params: &SetParams,
        rng: &mut R,
    ) -> Result<Self> {
        let set = SuperincreasingSet::random(block_size, params, rng)?;
        let private = PrivateKey::random(&set, rng)?;
        Self::from_parts(block_size, &set, private)
    }

    /// Instance from caller-chosen key material.
    ///
    /// The set must hold exactly `8 × block size` elements; the key pair is
    /// checked by `PublicKey::derive`. The set itself is not retained.
    pub fn from_parts(
        block_size: BlockSize,
        set: &SuperincreasingSet,
        private: PrivateKey,
    ) -> Result<Self> {
        if set.len() != block_size.bits() {
            return Err(invalid_key!(
                "set has {} elements, block size {} needs {}",
                set.len(),
                block_size.bytes(),
                block_size.bits()
            ));
        }

        let public = PublicKey::derive(set, &private)?;
        info!(
            "Knapsack ready: block_size={} private=({}) public=[{}]",
            block_size.bytes(),
            private,
            public
        );

        Ok(Self {
            block_size,
            private,
            public,
        })
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// encode + encrypt
    pub fn encrypt(&self, data: &[u8]) -> Result<Ciphertext> {
        encrypt(&encode(data, self.block_size), &self.public)
    }

    /// decrypt + decode
    pub fn decrypt(&self, cipher: &Ciphertext) -> Result<Vec<u8>> {
        let plain = decrypt(cipher, &self.private, &self.public)?;
        Ok(decode(&plain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_fixed_instances_round_trip() {
        let cases: [(usize, u64, u64, Vec<u64>); 2] = [
            (1, 672, 13, vec![3, 5, 9, 18, 38, 75, 155, 310]),
            (
                2,
                476729,
                476728,
                vec![
                    8, 17, 29, 56, 118, 234, 464, 931, 1862, 3724, 7448, 14900, 29794, 59591,
                    119183, 238364,
                ],
            ),
        ];

        for (bytes, u, v, set) in cases {
            let block_size = BlockSize::new(bytes).unwrap();
            let set = SuperincreasingSet::from_u64(&set).unwrap();
            let private = PrivateKey::from_u64(u, v).unwrap();
            let knapsack = Knapsack::from_parts(block_size, &set, private).unwrap();

            let cipher = knapsack.encrypt(b"Bat").unwrap();
            assert_eq!(knapsack.decrypt(&cipher).unwrap(), b"Bat");
        }
    }

    #[test]
    fn test_set_length_must_match_block_size() {
        let set = SuperincreasingSet::from_u64(&[3, 5, 9, 18, 38, 75, 155, 310]).unwrap();
        let private = PrivateKey::from_u64(672, 13).unwrap();
        assert!(Knapsack::from_parts(BlockSize::new(2).unwrap(), &set, private).is_err());
    }

    #[test]
    fn test_random_instances_round_trip() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for i in 0..40 {
            let block_size = BlockSize::new(i % 8 + 1).unwrap();
            let knapsack = Knapsack::random(block_size, &SetParams::default(), &mut rng).unwrap();

            let len = rng.gen_range(0..40);
            let data: Vec<u8> = (0..len).map(|_| rng.gen()).collect();

            let cipher = knapsack.encrypt(&data).unwrap();
            assert_eq!(knapsack.decrypt(&cipher).unwrap(), data, "instance {}", i);
        }
    }
}
