use anyhow::{Context, Result};
use blockseal_core::{
    BlockFactory, CancelToken, Ledger, LedgerConfig, ParallelPow, ProofOfWork, Sha256Pow,
    Transaction,
};
use clap::Parser;
use std::{path::PathBuf, time::Duration};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "blockseal")]
#[command(about = "Mine a small demo ledger and print its blocks")]
struct Cli {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Required leading zero bits of each block hash
    #[arg(long)]
    difficulty: Option<u32>,

    /// Informational reward recorded on each block
    #[arg(long)]
    reward: Option<u64>,

    /// Highest nonce a search may try before giving up
    #[arg(long)]
    max_nonce: Option<u64>,

    /// Abandon any single block search, genesis included, after this many
    /// seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Split the nonce search across all cores
    #[arg(long)]
    parallel: bool,

    /// Print the chain as JSON instead of text
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn ledger_config(&self) -> Result<LedgerConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                LedgerConfig::from_json_str(&raw)?
            }
            None => LedgerConfig::default(),
        };
        if let Some(bits) = self.difficulty {
            config.difficulty_bits = bits;
        }
        if let Some(reward) = self.reward {
            config.block_reward = reward;
        }
        if let Some(max_nonce) = self.max_nonce {
            config.max_nonce = max_nonce;
        }
        config.validate()?;
        Ok(config)
    }

    fn cancel_token(&self) -> CancelToken {
        match self.timeout_secs {
            Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
            None => CancelToken::new(),
        }
    }
}

fn sample_batches() -> Vec<Vec<Transaction>> {
    vec![
        vec![
            Transaction::new("Alice", "Bob", 10),
            Transaction::new("Bob", "Charlie", 5),
        ],
        vec![Transaction::new("Charlie", "Dave", 3)],
        vec![Transaction::new("Alice", "Dave", 200)],
    ]
}

fn build_ledger<P: ProofOfWork>(cli: &Cli, pow: P, config: &LedgerConfig) -> Result<Ledger<P>> {
    let factory = BlockFactory::new(pow, config.block_reward);
    Ledger::with_factory(factory, None, &cli.cancel_token()).context("mining genesis block")
}

fn run<P: ProofOfWork>(cli: &Cli, mut ledger: Ledger<P>) -> Result<()> {
    for batch in sample_batches() {
        let block = ledger.append_with_cancel(batch, &cli.cancel_token())?;
        info!(height = block.height(), nonce = block.header.nonce, "sealed");
    }
    ledger.verify().context("mined chain failed verification")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(ledger.blocks())?);
        return Ok(());
    }
    for block in ledger.blocks() {
        println!(
            "Height: {}, Hash: {}, Prev: {}",
            block.height(),
            block.hash_hex(),
            block.previous_hash_hex()
        );
        println!(
            "MerkleRoot: {}, Nonce: {}, Bits: {}, Reward: {}",
            block.merkle_root_hex(),
            block.header.nonce,
            block.header.difficulty_bits,
            block.header.reward
        );
        for (i, tx) in block.txs.iter().enumerate() {
            println!(
                "Txn({i}) - Sender {}, Receiver {}, Amount {} - {{{}}}",
                tx.sender, tx.receiver, tx.amount, tx.payload
            );
        }
        println!("-----");
    }
    Ok(())
}

fn execute(cli: &Cli) -> Result<()> {
    let config = cli.ledger_config()?;
    info!(difficulty = config.difficulty_bits, parallel = cli.parallel, "building ledger");

    if cli.parallel {
        let ledger = build_ledger(cli, ParallelPow::from_config(&config)?, &config)?;
        run(cli, ledger)
    } else {
        let ledger = build_ledger(cli, Sha256Pow::from_config(&config)?, &config)?;
        run(cli, ledger)
    }
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    execute(&Cli::parse())
}
