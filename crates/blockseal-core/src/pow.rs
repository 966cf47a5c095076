//! Proof-of-work search and validation.
//!
//! A header is sealed when `sha256(material(nonce))`, read as a 256-bit
//! big-endian integer, is strictly below `2^(256 - difficulty_bits)`.

use crate::cancel::CancelToken;
use crate::config::LedgerConfig;
use crate::constants::{HASH_BITS, HASH_SIZE};
use crate::error::{LedgerError, PowError, Result};
use crate::{BlockHeader, Hash};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Winning nonce and the digest it produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Seal {
    pub nonce: u64,
    pub hash: Hash,
}

/// A sealing strategy. `search` may be expensive, `validate` hashes once.
pub trait ProofOfWork: Send + Sync {
    fn difficulty_bits(&self) -> u32;

    fn search(&self, header: &BlockHeader, cancel: &CancelToken) -> Result<Seal, PowError>;

    /// Checks the header at its stored nonce against this engine's target.
    fn validate(&self, header: &BlockHeader) -> bool {
        let bits = self.difficulty_bits();
        header.difficulty_bits == bits
            && target(bits).is_some_and(|target| meets_target(&header.hash(), &target))
    }
}

/// `2^(256 - difficulty_bits)` as 32 big-endian bytes, or `None` when
/// `difficulty_bits` is outside `1..256`.
pub fn target(difficulty_bits: u32) -> Option<Hash> {
    if difficulty_bits == 0 || difficulty_bits >= HASH_BITS {
        return None;
    }
    let shift = (HASH_BITS - difficulty_bits) as usize;
    let mut out = [0u8; HASH_SIZE];
    out[HASH_SIZE - 1 - shift / 8] = 1 << (shift % 8);
    Some(out)
}

/// Byte-wise comparison of equal-length big-endian values is numeric.
pub fn meets_target(hash: &Hash, target: &Hash) -> bool {
    hash < target
}

pub fn count_leading_zero_bits(hash: &Hash) -> u32 {
    let mut total = 0u32;
    for b in hash {
        if *b == 0 {
            total += 8;
        } else {
            total += b.leading_zeros();
            break;
        }
    }
    total
}

/// Hasher already fed with everything but the nonce, cloned per attempt.
pub(crate) fn prefix_hasher(header: &BlockHeader) -> Sha256 {
    Sha256::new_with_prefix(header.material_prefix())
}

pub(crate) fn hash_nonce(prefix: &Sha256, nonce: u64) -> Hash {
    let mut hasher = prefix.clone();
    hasher.update(nonce.to_be_bytes());
    hasher.finalize().into()
}

/// Linear search from nonce 0 upward; returns the lowest valid nonce.
#[derive(Clone, Debug)]
pub struct Sha256Pow {
    difficulty_bits: u32,
    target: Hash,
    max_nonce: u64,
    check_interval: u64,
}

impl Sha256Pow {
    pub fn new(difficulty_bits: u32) -> Result<Self> {
        Self::from_config(&LedgerConfig::with_difficulty(difficulty_bits))
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            difficulty_bits: config.difficulty_bits,
            target: target(config.difficulty_bits).ok_or_else(|| {
                LedgerError::InvalidConfig(format!(
                    "no target for {} difficulty bits",
                    config.difficulty_bits
                ))
            })?,
            max_nonce: config.max_nonce,
            check_interval: config.cancel_check_interval.max(1),
        })
    }

    pub fn max_nonce(&self) -> u64 {
        self.max_nonce
    }

    pub fn check_interval(&self) -> u64 {
        self.check_interval
    }

    pub fn target(&self) -> &Hash {
        &self.target
    }
}

impl ProofOfWork for Sha256Pow {
    fn difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }

    fn search(&self, header: &BlockHeader, cancel: &CancelToken) -> Result<Seal, PowError> {
        let prefix = prefix_hasher(header);
        let mut nonce = 0u64;
        loop {
            if nonce % self.check_interval == 0 && cancel.is_cancelled() {
                return Err(PowError::Cancelled { attempts: nonce });
            }
            let hash = hash_nonce(&prefix, nonce);
            if meets_target(&hash, &self.target) {
                debug!(
                    height = header.height,
                    nonce,
                    zero_bits = count_leading_zero_bits(&hash),
                    "found nonce"
                );
                return Ok(Seal { nonce, hash });
            }
            if nonce == self.max_nonce {
                return Err(PowError::Exhausted {
                    max_nonce: self.max_nonce,
                });
            }
            nonce += 1;
        }
    }
}
