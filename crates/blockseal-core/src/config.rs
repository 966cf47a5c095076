use crate::constants::{BLOCK_REWARD, CANCEL_CHECK_INTERVAL, HASH_BITS, POW_TARGET_DIFFICULTY};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Tunables for one ledger. Every chain carries its own copy, so tests and
/// callers can run chains of different difficulty side by side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Required leading zero bits; target is 2^(256 - difficulty_bits).
    pub difficulty_bits: u32,
    /// Informational reward recorded on every block.
    pub block_reward: u64,
    /// Highest nonce the search may try (inclusive).
    pub max_nonce: u64,
    pub cancel_check_interval: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty_bits: POW_TARGET_DIFFICULTY,
            block_reward: BLOCK_REWARD,
            max_nonce: u64::MAX,
            cancel_check_interval: CANCEL_CHECK_INTERVAL,
        }
    }
}

impl LedgerConfig {
    pub fn with_difficulty(difficulty_bits: u32) -> Self {
        Self {
            difficulty_bits,
            ..Self::default()
        }
    }

    /// Parse a JSON document; missing fields fall back to the defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw).map_err(LedgerError::ConfigParse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.difficulty_bits == 0 || self.difficulty_bits >= HASH_BITS {
            return Err(LedgerError::InvalidConfig(format!(
                "difficulty_bits must be within 1..{HASH_BITS}, got {}",
                self.difficulty_bits
            )));
        }
        if self.cancel_check_interval == 0 {
            return Err(LedgerError::InvalidConfig(
                "cancel_check_interval must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
