use crate::constants::{BLOCK_VERSION, HASH_SIZE};
use crate::{sha256, Hash, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub height: u64,
    /// Seconds since the unix epoch.
    pub timestamp: i64,
    /// `None` only for genesis.
    pub previous_hash: Option<Hash>,
    /// `None` when the block carries no transactions.
    pub merkle_root: Option<Hash>,
    pub difficulty_bits: u32,
    pub nonce: u64,
    /// Informational, not part of the sealed material.
    pub reward: u64,
}

impl BlockHeader {
    pub fn new(
        height: u64,
        timestamp: i64,
        previous_hash: Option<Hash>,
        merkle_root: Option<Hash>,
        difficulty_bits: u32,
        reward: u64,
    ) -> Self {
        Self {
            version: BLOCK_VERSION,
            height,
            timestamp,
            previous_hash,
            merkle_root,
            difficulty_bits,
            nonce: 0,
            reward,
        }
    }

    /// Bytes hashed for proof of work at `nonce`:
    /// previous hash, merkle root, timestamp, difficulty bits, nonce.
    /// Absent digests contribute no bytes; integers are 8-byte big-endian.
    pub fn material(&self, nonce: u64) -> Vec<u8> {
        let mut bytes = self.material_prefix();
        bytes.extend_from_slice(&nonce.to_be_bytes());
        bytes
    }

    /// Everything in `material` except the trailing nonce.
    pub fn material_prefix(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HASH_SIZE * 2 + 8 * 3);
        if let Some(previous_hash) = &self.previous_hash {
            bytes.extend_from_slice(previous_hash);
        }
        if let Some(merkle_root) = &self.merkle_root {
            bytes.extend_from_slice(merkle_root);
        }
        bytes.extend_from_slice(&self.timestamp.to_be_bytes());
        bytes.extend_from_slice(&u64::from(self.difficulty_bits).to_be_bytes());
        bytes
    }

    pub fn hash_with_nonce(&self, nonce: u64) -> Hash {
        sha256(&[self.material(nonce)])
    }

    /// Digest of the header at its stored nonce.
    pub fn hash(&self) -> Hash {
        self.hash_with_nonce(self.nonce)
    }
}

/// A sealed block. `hash` is frozen at sealing time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub hash: Hash,
    pub txs: Vec<Transaction>,
}

impl Block {
    pub fn height(&self) -> u64 {
        self.header.height
    }

    pub fn is_genesis(&self) -> bool {
        self.header.height == 0 && self.header.previous_hash.is_none()
    }

    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    pub fn previous_hash_hex(&self) -> String {
        self.header.previous_hash.map(hex::encode).unwrap_or_default()
    }

    pub fn merkle_root_hex(&self) -> String {
        self.header.merkle_root.map(hex::encode).unwrap_or_default()
    }
}
