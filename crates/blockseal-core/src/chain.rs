use crate::cancel::CancelToken;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::factory::BlockFactory;
use crate::merkle::merkle_root;
use crate::pow::{ProofOfWork, Sha256Pow};
use crate::{Block, Transaction};
use tracing::{info, warn};

/// Append-only chain of sealed blocks.
///
/// Appends take `&mut self`, so there is only ever one writer. Readers get
/// `&Block` or owned copies; nothing hands out mutable access to history.
#[derive(Clone, Debug)]
pub struct Ledger<P = Sha256Pow> {
    factory: BlockFactory<P>,
    blocks: Vec<Block>,
}

impl Ledger<Sha256Pow> {
    /// Builds a linear-search ledger and mines its genesis block.
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        Self::with_engine(Sha256Pow::from_config(config)?, config)
    }
}

impl<P: ProofOfWork> Ledger<P> {
    /// Mines genesis with no way to cancel; use `with_factory` when the
    /// genesis search needs a deadline.
    pub fn with_engine(pow: P, config: &LedgerConfig) -> Result<Self> {
        let factory = BlockFactory::new(pow, config.block_reward);
        Self::with_factory(factory, None, &CancelToken::new())
    }

    /// Mines the genesis block from `seed` (or the stock seed) and starts
    /// the chain with it.
    pub fn with_factory(
        factory: BlockFactory<P>,
        seed: Option<Transaction>,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let genesis = factory.create_genesis_block(seed, cancel)?;
        info!("genesis block {}", genesis.hash_hex());
        Ok(Self {
            factory,
            blocks: vec![genesis],
        })
    }

    /// Adopts an existing chain after checking every block in it.
    pub fn from_blocks(factory: BlockFactory<P>, blocks: Vec<Block>) -> Result<Self> {
        let ledger = Self { factory, blocks };
        ledger.verify()?;
        Ok(ledger)
    }

    pub fn pow(&self) -> &P {
        self.factory.pow()
    }

    pub fn tip(&self) -> Result<&Block> {
        self.blocks.last().ok_or(LedgerError::EmptyChain)
    }

    /// Height of the tip block.
    pub fn height(&self) -> Result<u64> {
        Ok(self.tip()?.height())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, height: u64) -> Option<&Block> {
        usize::try_from(height)
            .ok()
            .and_then(|index| self.blocks.get(index))
    }

    /// The whole chain in height order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn snapshot(&self) -> Vec<Block> {
        self.blocks.clone()
    }

    pub fn append(&mut self, txs: Vec<Transaction>) -> Result<&Block> {
        self.append_with_cancel(txs, &CancelToken::new())
    }

    /// Seals the next block against the tip and appends it. On error the
    /// chain is unchanged.
    pub fn append_with_cancel(
        &mut self,
        txs: Vec<Transaction>,
        cancel: &CancelToken,
    ) -> Result<&Block> {
        let block = self.prepare_next(txs, cancel)?;
        self.push(block)?;
        self.tip()
    }

    /// Seals a successor of the current tip without touching the chain.
    /// Pair with `push`; a block sealed against an outdated tip is refused.
    pub fn prepare_next(&self, txs: Vec<Transaction>, cancel: &CancelToken) -> Result<Block> {
        let tip = self.tip()?;
        self.factory
            .create_block(txs, Some(tip.hash), tip.height() + 1, cancel)
    }

    /// Appends an already sealed block after checking it extends the tip.
    pub fn push(&mut self, block: Block) -> Result<()> {
        let tip = self.tip()?;
        self.check_link(tip, &block)?;
        if block.header.timestamp < tip.header.timestamp {
            warn!(
                height = block.height(),
                timestamp = block.header.timestamp,
                previous = tip.header.timestamp,
                "block timestamp is earlier than its predecessor"
            );
        }
        info!(height = block.height(), hash = %block.hash_hex(), "appended block");
        self.blocks.push(block);
        Ok(())
    }

    /// Re-checks linkage, merkle roots, hashes and proof of work for every
    /// block.
    pub fn verify(&self) -> Result<()> {
        let genesis = self.blocks.first().ok_or(LedgerError::EmptyChain)?;
        if genesis.height() != 0 {
            return Err(LedgerError::HeightMismatch {
                expected: 0,
                got: genesis.height(),
            });
        }
        if let Some(previous) = genesis.header.previous_hash {
            return Err(LedgerError::PreviousHashMismatch {
                height: 0,
                expected: String::new(),
                got: hex::encode(previous),
            });
        }
        self.check_seal(genesis)?;
        for pair in self.blocks.windows(2) {
            self.check_link(&pair[0], &pair[1])?;
        }
        Ok(())
    }

    fn check_link(&self, previous: &Block, block: &Block) -> Result<()> {
        let expected = previous.height() + 1;
        if block.height() != expected {
            return Err(LedgerError::HeightMismatch {
                expected,
                got: block.height(),
            });
        }
        if block.header.previous_hash != Some(previous.hash) {
            return Err(LedgerError::PreviousHashMismatch {
                height: block.height(),
                expected: previous.hash_hex(),
                got: block.previous_hash_hex(),
            });
        }
        self.check_seal(block)
    }

    fn check_seal(&self, block: &Block) -> Result<()> {
        let height = block.height();
        if merkle_root(&block.txs)? != block.header.merkle_root {
            return Err(LedgerError::MerkleRootMismatch { height });
        }
        if block.header.hash() != block.hash {
            return Err(LedgerError::HashMismatch { height });
        }
        if !self.pow().validate(&block.header) {
            return Err(LedgerError::InvalidProofOfWork {
                height,
                difficulty_bits: self.pow().difficulty_bits(),
            });
        }
        Ok(())
    }
}
