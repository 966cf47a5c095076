pub const BYTE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const HASH_BITS: u32 = (HASH_SIZE * BYTE) as u32;
pub const POW_TARGET_DIFFICULTY: u32 = 16;
pub const BLOCK_VERSION: u32 = 1;
pub const BLOCK_REWARD: u64 = 50;
/// Nonce attempts between two looks at the cancel token.
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;
pub const GENESIS_SENDER: &str = "genesis";
pub const GENESIS_RECEIVER: &str = "satoshi";
pub const GENESIS_AMOUNT: u64 = 100;
pub const GENESIS_PAYLOAD: &str = "Genesis Block";
