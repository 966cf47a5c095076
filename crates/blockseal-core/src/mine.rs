use crate::cancel::CancelToken;
use crate::config::LedgerConfig;
use crate::error::{PowError, Result};
use crate::pow::{hash_nonce, meets_target, prefix_hasher, ProofOfWork, Seal, Sha256Pow};
use crate::BlockHeader;
use rayon::prelude::*;
use tracing::debug;

/// Searches nonces in parallel. Rayon splits the nonce range across its
/// pool and `find_first` keeps the lowest hit, so the seal is the same one
/// the linear search would return.
///
/// Cancellation takes precedence here: a cancel observed at a lower nonce
/// wins over a valid nonce another worker already found higher up.
#[derive(Clone, Debug)]
pub struct ParallelPow {
    inner: Sha256Pow,
}

impl ParallelPow {
    pub fn new(difficulty_bits: u32) -> Result<Self> {
        Self::from_config(&LedgerConfig::with_difficulty(difficulty_bits))
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        Ok(Self {
            inner: Sha256Pow::from_config(config)?,
        })
    }
}

impl ProofOfWork for ParallelPow {
    fn difficulty_bits(&self) -> u32 {
        self.inner.difficulty_bits()
    }

    fn search(&self, header: &BlockHeader, cancel: &CancelToken) -> Result<Seal, PowError> {
        let prefix = prefix_hasher(header);
        let target = *self.inner.target();
        let interval = self.inner.check_interval();

        // A cancelled token also stops the scan; the hit is re-checked below.
        let found = (0..=self.inner.max_nonce())
            .into_par_iter()
            .find_first(|nonce| {
                (nonce % interval == 0 && cancel.is_cancelled())
                    || meets_target(&hash_nonce(&prefix, *nonce), &target)
            })
            .ok_or(PowError::Exhausted {
                max_nonce: self.inner.max_nonce(),
            })?;

        let hash = hash_nonce(&prefix, found);
        if !meets_target(&hash, &target) {
            return Err(PowError::Cancelled { attempts: found });
        }
        debug!(height = header.height, nonce = found, "parallel search found nonce");
        Ok(Seal { nonce: found, hash })
    }
}
