//! Merkle root over a block's ordered transactions.

use crate::error::Result;
use crate::{sha256, Hash, Transaction};

pub fn leaf_hash(tx: &Transaction) -> Result<Hash> {
    Ok(sha256(&[&tx.canonical_bytes()?]))
}

/// Root of the transaction list, or `None` when there are no transactions.
///
/// `None` is the empty-digest sentinel: it contributes zero bytes to the
/// header material and must not be read as a real root.
pub fn merkle_root(txs: &[Transaction]) -> Result<Option<Hash>> {
    let leaves = txs.iter().map(leaf_hash).collect::<Result<Vec<_>>>()?;
    Ok(merkle_root_from_leaves(&leaves))
}

/// Pairs adjacent digests left to right. An unpaired last digest is carried
/// up unchanged, never hashed with itself.
pub fn merkle_root_from_leaves(leaves: &[Hash]) -> Option<Hash> {
    if leaves.is_empty() {
        return None;
    }
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [left, right] => sha256(&[left, right]),
                [odd] => *odd,
                _ => unreachable!("chunks(2) yields one or two digests"),
            })
            .collect();
    }
    level.first().copied()
}
