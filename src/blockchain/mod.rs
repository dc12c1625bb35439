pub mod block;
pub mod difficulty;
pub mod model;
pub mod pow;

pub use block::{Block, MinerId};
pub use model::ChainLedger;

/// Miners started when the process boots.
pub const DEFAULT_MINER_COUNT: usize = 4;

/// Initial Proof-of-Work difficulty (leading zero bits).
pub const DEFAULT_DIFFICULTY: f64 = 20.0;

/// Reward credited to the winner of each block.
pub const BASE_REWARD: u64 = 20;

/// Target seconds per block for auto-adjust
pub const TARGET_BLOCK_TIME_SECS: u64 = 10;

/// How many blocks make up one retarget window
pub const DIFF_ADJUST_WINDOW: usize = 10;
