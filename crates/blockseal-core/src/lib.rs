//! Append-only, tamper-evident ledger of proof-of-work sealed blocks.
//!
//! Transactions are summarised by a merkle root, each header commits to the
//! previous block's hash, and a nonce search seals the header under a
//! difficulty target.

pub mod block;
pub mod cancel;
pub mod chain;
pub mod config;
pub mod constants;
pub mod error;
pub mod factory;
pub mod merkle;
pub mod mine;
pub mod pow;
pub mod transaction;

use sha2::{Digest, Sha256};

pub use block::{Block, BlockHeader};
pub use cancel::CancelToken;
pub use chain::Ledger;
pub use config::LedgerConfig;
pub use error::{LedgerError, PowError, Result};
pub use factory::BlockFactory;
pub use merkle::merkle_root;
pub use mine::ParallelPow;
pub use pow::{ProofOfWork, Seal, Sha256Pow};
pub use transaction::Transaction;

pub type Hash = [u8; 32];

/// SHA-256 over the concatenation of `parts`.
pub fn sha256<T: AsRef<[u8]>>(parts: &[T]) -> Hash {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
