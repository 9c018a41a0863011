//! Plaintext / ciphertext transforms
//!
//! Bytes are packed big-endian into `block size`-byte blocks; the final block
//! is zero padded. Both `Plaintext` and `Ciphertext` remember the original
//! byte length, so decoding truncates the padding instead of stripping every
//! zero byte, and embedded zero bytes survive a round trip.

use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::keys::{PrivateKey, PublicKey};
use crate::error::{KnapsackError, Result};
use crate::math::mul_mod;
use crate::params::BlockSize;

/// Encoded message: one unsigned integer per block plus the byte length
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plaintext {
    block_size: BlockSize,
    blocks: Vec<u64>,
    len: usize,
}

impl Plaintext {
    /// Assemble from raw blocks, e.g. a bit pattern read off a lattice vector
    pub fn from_blocks(block_size: BlockSize, blocks: Vec<u64>, len: usize) -> Self {
        let len = len.min(blocks.len() * block_size.bytes());
        Self {
            block_size,
            blocks,
            len,
        }
    }

    pub fn block_size(&self) -> BlockSize {
        self.block_size
    }

    pub fn blocks(&self) -> &[u64] {
        &self.blocks
    }

    /// Original message length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Encrypted message: one subset sum per block plus the byte length
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    blocks: Vec<BigUint>,
    len: usize,
}

impl Ciphertext {
    /// Wrap received blocks; `len` must fall inside the last block
    pub fn new(blocks: Vec<BigUint>, len: usize, block_size: BlockSize) -> Result<Self> {
        let width = block_size.bytes();
        let max = blocks.len() * width;
        let min = blocks.len().saturating_sub(1) * width;
        let in_last_block = len > min || blocks.is_empty();

        if len > max || !in_last_block {
            return Err(KnapsackError::InvalidParameters(format!(
                "byte length {} does not fit {} block(s) of {} byte(s)",
                len,
                blocks.len(),
                width
            )));
        }
        Ok(Self { blocks, len })
    }

    /// Ciphertext whose byte length is a whole number of blocks
    pub fn from_u64(blocks: &[u64], block_size: BlockSize) -> Self {
        Self {
            blocks: blocks.iter().copied().map(BigUint::from).collect(),
            len: blocks.len() * block_size.bytes(),
        }
    }

    pub fn blocks(&self) -> &[BigUint] {
        &self.blocks
    }

    /// Original message length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for the encryption of an empty message
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.blocks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        Ok(())
    }
}

/// Split `bytes` into big-endian blocks, zero padding the last one
pub fn encode(bytes: &[u8], block_size: BlockSize) -> Plaintext {
    let width = block_size.bytes();
    let blocks = bytes
        .chunks(width)
        .map(|chunk| {
            let mut block = [0u8; 8];
            block[8 - width..8 - width + chunk.len()].copy_from_slice(chunk);
            u64::from_be_bytes(block)
        })
        .collect();

    Plaintext {
        block_size,
        blocks,
        len: bytes.len(),
    }
}

/// Concatenate block bytes and drop the padding past the original length
pub fn decode(plain: &Plaintext) -> Vec<u8> {
    let width = plain.block_size.bytes();
    let mut data: Vec<u8> = plain
        .blocks
        .iter()
        .flat_map(|b| b.to_be_bytes()[8 - width..].to_vec())
        .collect();
    data.truncate(plain.len);
    data
}

/// Subset sum of `public[i]` over the set bits of `block`, most significant bit first
pub fn encrypt_block(block: u64, public: &PublicKey) -> BigUint {
    let n = public.len();
    public
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            block
                .checked_shr((n - 1 - i) as u32)
                .map_or(false, |b| b & 1 == 1)
        })
        .fold(BigUint::zero(), |acc, (_, a)| acc + a)
}

/// Encrypt every block of `plain` under `public`
pub fn encrypt(plain: &Plaintext, public: &PublicKey) -> Result<Ciphertext> {
    if public.len() != plain.block_size.bits() {
        return Err(KnapsackError::DimensionMismatch {
            expected: plain.block_size.bits(),
            actual: public.len(),
        });
    }

    let blocks = plain
        .blocks
        .par_iter()
        .map(|&block| encrypt_block(block, public))
        .collect();

    Ok(Ciphertext {
        blocks,
        len: plain.len,
    })
}

/// The superincreasing set hidden in `public`, S[i] = (PublicKey[i] · W) mod U
fn recover_set(public: &PublicKey, w: &BigUint, u: &BigUint) -> Vec<BigUint> {
    public.iter().map(|a| mul_mod(a, w, u)).collect()
}

/// Greedy subset-sum recovery against a superincreasing `set`
fn unwrap_block(value: &BigUint, w: &BigUint, u: &BigUint, set: &[BigUint]) -> u64 {
    let n = set.len();
    let mut t = mul_mod(value, w, u);
    let mut block = 0u64;

    for i in (0..n).rev() {
        if t >= set[i] {
            t -= &set[i];
            block |= 1u64 << (n - 1 - i);
        }
    }
    block
}

/// Decrypt with the private trapdoor.
///
/// Fails with `InvalidKey` for U = 0 and `NoInverse` when V is not
/// invertible modulo U.
pub fn decrypt(cipher: &Ciphertext, private: &PrivateKey, public: &PublicKey) -> Result<Plaintext> {
    let block_size = public.block_size()?;
    let w = private.inverse_multiplier()?;
    let set = recover_set(public, &w, private.u());

    let blocks = cipher
        .blocks
        .iter()
        .map(|c| unwrap_block(c, &w, private.u(), &set))
        .collect();

    Ok(Plaintext::from_blocks(block_size, blocks, cipher.len))
}
