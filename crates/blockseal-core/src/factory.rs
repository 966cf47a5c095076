use crate::cancel::CancelToken;
use crate::constants::{GENESIS_AMOUNT, GENESIS_PAYLOAD, GENESIS_RECEIVER, GENESIS_SENDER};
use crate::error::{LedgerError, Result};
use crate::merkle::merkle_root;
use crate::pow::ProofOfWork;
use crate::{Block, BlockHeader, Hash, Transaction};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Assembles headers and drives a `ProofOfWork` engine to seal them.
#[derive(Clone, Debug)]
pub struct BlockFactory<P> {
    pow: P,
    reward: u64,
}

impl<P: ProofOfWork> BlockFactory<P> {
    pub fn new(pow: P, reward: u64) -> Self {
        Self { pow, reward }
    }

    pub fn pow(&self) -> &P {
        &self.pow
    }

    pub fn reward(&self) -> u64 {
        self.reward
    }

    /// Seals a block stamped with the current time. Blocks until the search
    /// succeeds, is cancelled, or runs out of nonces.
    pub fn create_block(
        &self,
        txs: Vec<Transaction>,
        previous_hash: Option<Hash>,
        height: u64,
        cancel: &CancelToken,
    ) -> Result<Block> {
        self.create_block_at(txs, previous_hash, height, unix_now()?, cancel)
    }

    pub fn create_block_at(
        &self,
        txs: Vec<Transaction>,
        previous_hash: Option<Hash>,
        height: u64,
        timestamp: i64,
        cancel: &CancelToken,
    ) -> Result<Block> {
        let merkle = merkle_root(&txs)?;
        let mut header = BlockHeader::new(
            height,
            timestamp,
            previous_hash,
            merkle,
            self.pow.difficulty_bits(),
            self.reward,
        );

        let seal = self.pow.search(&header, cancel)?;
        header.nonce = seal.nonce;

        // Search and validate hash the same material; disagreement is a bug.
        assert!(
            self.pow.validate(&header) && header.hash() == seal.hash,
            "sealed block {height} failed its own proof-of-work check"
        );

        info!(
            "Mined block {} with nonce {} and hash {}",
            height,
            seal.nonce,
            hex::encode(seal.hash)
        );

        Ok(Block {
            header,
            hash: seal.hash,
            txs,
        })
    }

    /// Height 0, no previous hash. `seed` defaults to the stock genesis
    /// transfer.
    pub fn create_genesis_block(
        &self,
        seed: Option<Transaction>,
        cancel: &CancelToken,
    ) -> Result<Block> {
        let seed = seed.unwrap_or_else(default_genesis_transaction);
        self.create_block(vec![seed], None, 0, cancel)
    }
}

pub fn default_genesis_transaction() -> Transaction {
    Transaction::new(GENESIS_SENDER, GENESIS_RECEIVER, GENESIS_AMOUNT).with_payload(GENESIS_PAYLOAD)
}

pub(crate) fn unix_now() -> Result<i64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| LedgerError::Clock)?;
    i64::try_from(elapsed.as_secs()).map_err(|_| LedgerError::Clock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PowError;
    use crate::pow::Sha256Pow;

    fn factory(bits: u32) -> BlockFactory<Sha256Pow> {
        BlockFactory::new(Sha256Pow::new(bits).unwrap(), 50)
    }

    #[test]
    fn create_block_seals_and_validates() {
        let factory = factory(8);
        let txs = vec![
            Transaction::new("Alice", "Bob", 10),
            Transaction::new("Bob", "Charlie", 5),
        ];
        let block = factory
            .create_block(txs.clone(), Some([9u8; 32]), 4, &CancelToken::new())
            .unwrap();
        assert_eq!(block.header.height, 4);
        assert_eq!(block.header.previous_hash, Some([9u8; 32]));
        assert_eq!(block.header.merkle_root, merkle_root(&txs).unwrap());
        assert_eq!(block.header.difficulty_bits, 8);
        assert_eq!(block.header.reward, 50);
        assert_eq!(block.hash, block.header.hash());
        assert!(factory.pow().validate(&block.header));
        assert_eq!(block.txs, txs);
    }

    #[test]
    fn fixed_timestamp_is_reproducible() {
        let factory = factory(8);
        let cancel = CancelToken::new();
        let txs = vec![Transaction::new("Alice", "Bob", 10)];
        let a = factory
            .create_block_at(txs.clone(), None, 1, 1_600_000_000, &cancel)
            .unwrap();
        let b = factory
            .create_block_at(txs, None, 1, 1_600_000_000, &cancel)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_block_has_no_merkle_root() {
        let block = factory(8)
            .create_block(vec![], Some([1u8; 32]), 1, &CancelToken::new())
            .unwrap();
        assert_eq!(block.header.merkle_root, None);
        assert!(block.txs.is_empty());
    }

    #[test]
    fn genesis_block_example() {
        let genesis = factory(8)
            .create_genesis_block(None, &CancelToken::new())
            .unwrap();
        assert!(genesis.is_genesis());
        assert_eq!(genesis.header.height, 0);
        assert_eq!(genesis.header.previous_hash, None);
        assert_eq!(genesis.txs, vec![default_genesis_transaction()]);
        assert_eq!(genesis.txs[0].payload, "Genesis Block");
    }

    #[test]
    fn genesis_accepts_custom_seed() {
        let seed = Transaction::new("genesis", "miner", 50);
        let genesis = factory(8)
            .create_genesis_block(Some(seed.clone()), &CancelToken::new())
            .unwrap();
        assert_eq!(genesis.txs, vec![seed]);
    }

    #[test]
    fn cancelled_search_surfaces_as_error() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = factory(16)
            .create_block(vec![], None, 0, &cancel)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Pow(PowError::Cancelled { attempts: 0 })
        ));
    }
}
