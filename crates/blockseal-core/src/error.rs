use thiserror::Error;

/// Why a nonce search stopped without a seal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PowError {
    #[error("nonce search cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("nonce space exhausted up to {max_nonce}")]
    Exhausted { max_nonce: u64 },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("proof-of-work search failed: {0}")]
    Pow(#[from] PowError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config is not valid JSON: {0}")]
    ConfigParse(#[source] serde_json::Error),

    #[error("system clock is before the unix epoch")]
    Clock,

    #[error("ledger has no genesis block")]
    EmptyChain,

    #[error("block height {got} does not follow tip, expected {expected}")]
    HeightMismatch { expected: u64, got: u64 },

    #[error("block {height} links to {got}, tip hash is {expected}")]
    PreviousHashMismatch {
        height: u64,
        expected: String,
        got: String,
    },

    #[error("block {height} merkle root does not match its transactions")]
    MerkleRootMismatch { height: u64 },

    #[error("block {height} stored hash does not match its header")]
    HashMismatch { height: u64 },

    #[error("block {height} does not satisfy {difficulty_bits}-bit proof of work")]
    InvalidProofOfWork { height: u64, difficulty_bits: u32 },
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
