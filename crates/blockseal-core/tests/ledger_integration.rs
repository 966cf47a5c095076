use blockseal_core::{
    merkle_root, BlockHeader, CancelToken, Ledger, LedgerConfig, LedgerError, ParallelPow,
    PowError, ProofOfWork, Seal, Sha256Pow, Transaction,
};
use std::sync::{Arc, RwLock};
use std::time::Duration;

fn config(bits: u32) -> LedgerConfig {
    LedgerConfig::with_difficulty(bits)
}

/// Seals genesis at 8 bits, then searches a 64-bit target that only a
/// cancel can end.
struct StallAfterGenesis {
    easy: Sha256Pow,
    hard: Sha256Pow,
}

impl StallAfterGenesis {
    fn new() -> Self {
        Self {
            easy: Sha256Pow::new(8).expect("valid difficulty"),
            hard: Sha256Pow::new(64).expect("valid difficulty"),
        }
    }
}

impl ProofOfWork for StallAfterGenesis {
    fn difficulty_bits(&self) -> u32 {
        self.easy.difficulty_bits()
    }

    fn search(&self, header: &BlockHeader, cancel: &CancelToken) -> Result<Seal, PowError> {
        if header.height == 0 {
            self.easy.search(header, cancel)
        } else {
            self.hard.search(header, cancel)
        }
    }
}

#[tokio::test]
async fn test_end_to_end_scenario() -> anyhow::Result<()> {
    let mut ledger = Ledger::new(&config(16))?;
    assert_eq!(ledger.height()?, 0);

    let first = vec![
        Transaction::new("Alice", "Bob", 10),
        Transaction::new("Bob", "Charlie", 5),
    ];
    ledger.append(first.clone())?;
    ledger.append(vec![Transaction::new("Charlie", "Dave", 3)])?;

    let blocks = ledger.blocks();
    assert_eq!(blocks.len(), 3);
    let heights: Vec<u64> = blocks.iter().map(|b| b.height()).collect();
    assert_eq!(heights, vec![0, 1, 2]);
    assert_eq!(blocks[1].header.previous_hash, Some(blocks[0].hash));
    assert_eq!(blocks[2].header.previous_hash, Some(blocks[1].hash));
    assert_eq!(blocks[1].header.merkle_root, merkle_root(&first)?);
    assert!(ledger.pow().validate(&blocks[1].header));
    assert!(ledger.pow().validate(&blocks[2].header));
    ledger.verify()?;
    Ok(())
}

#[tokio::test]
async fn test_corrupted_nonce_fails_validation() -> anyhow::Result<()> {
    let mut ledger = Ledger::new(&config(16))?;
    ledger.append(vec![Transaction::new("Alice", "Bob", 10)])?;
    let mut header = ledger.tip()?.header.clone();
    assert!(ledger.pow().validate(&header));
    header.nonce += 1;
    assert!(!ledger.pow().validate(&header));
    Ok(())
}

#[tokio::test]
async fn test_parallel_engine_ledger() -> anyhow::Result<()> {
    let cfg = config(12);
    let mut ledger = Ledger::with_engine(ParallelPow::from_config(&cfg)?, &cfg)?;
    for i in 0..4u64 {
        ledger.append(vec![Transaction::new(format!("from_{i}"), format!("to_{i}"), i)])?;
    }
    assert_eq!(ledger.len(), 5);
    ledger.verify()?;
    Ok(())
}

#[tokio::test]
async fn test_cancel_from_another_task() -> anyhow::Result<()> {
    let mut ledger = Ledger::with_engine(StallAfterGenesis::new(), &config(8))?;
    let cancel = CancelToken::new();
    let worker_cancel = cancel.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let outcome = ledger
            .append_with_cancel(vec![Transaction::new("Alice", "Bob", 1)], &worker_cancel)
            .map(|block| block.height());
        (ledger, outcome)
    });
    cancel.cancel();
    let (ledger, outcome) = handle.await?;
    assert!(matches!(
        outcome,
        Err(LedgerError::Pow(PowError::Cancelled { .. }))
    ));
    assert_eq!(ledger.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_search_timeout() -> anyhow::Result<()> {
    let mut ledger = Ledger::with_engine(StallAfterGenesis::new(), &config(8))?;
    let timeout = CancelToken::with_timeout(Duration::from_millis(20));
    let result = tokio::task::spawn_blocking(move || {
        ledger
            .append_with_cancel(vec![], &timeout)
            .map(|block| block.height())
    })
    .await?;
    assert!(matches!(
        result,
        Err(LedgerError::Pow(PowError::Cancelled { .. }))
    ));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_miners_single_writer() -> anyhow::Result<()> {
    let ledger = Arc::new(RwLock::new(Ledger::new(&config(10))?));
    let mut handles = Vec::new();
    for i in 0..4u64 {
        let ledger = Arc::clone(&ledger);
        handles.push(tokio::task::spawn_blocking(move || {
            let tx = Transaction::new(format!("miner_{i}"), "pool", i);
            loop {
                // Mine under a read guard, then race for the write guard.
                let block = ledger
                    .read()
                    .expect("ledger lock poisoned")
                    .prepare_next(vec![tx.clone()], &CancelToken::new())
                    .expect("sealing failed");
                let mut guard = ledger.write().expect("ledger lock poisoned");
                match guard.push(block) {
                    Ok(()) => return,
                    Err(LedgerError::HeightMismatch { .. })
                    | Err(LedgerError::PreviousHashMismatch { .. }) => continue,
                    Err(e) => panic!("unexpected push failure: {e}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.await?;
    }

    let guard = ledger.read().expect("ledger lock poisoned");
    assert_eq!(guard.len(), 5);
    guard.verify()?;
    let mut senders: Vec<String> = guard.blocks()[1..]
        .iter()
        .map(|b| b.txs[0].sender.clone())
        .collect();
    senders.sort();
    assert_eq!(senders, vec!["miner_0", "miner_1", "miner_2", "miner_3"]);
    Ok(())
}
