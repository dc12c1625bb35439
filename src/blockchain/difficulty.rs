use log::info;

use super::Block;

/// Lower bound of the per-window adjustment: difficulty may at most halve.
pub const MIN_ADJUST_RATIO: f64 = 0.5;

/// Upper bound of the per-window adjustment: difficulty may rise 10% at most.
pub const MAX_ADJUST_RATIO: f64 = 1.1;

/// Retargets the difficulty every `window` blocks from the acceptance
/// timestamps of the window's first and last block.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyController {
    pub window: usize,
    pub target_block_time_secs: u64,
}

impl DifficultyController {
    pub fn new(window: usize, target_block_time_secs: u64) -> Self {
        Self {
            window,
            target_block_time_secs,
        }
    }

    /// Whether a chain of `chain_len` blocks closes a window.
    pub fn is_due(&self, chain_len: usize) -> bool {
        self.window > 0 && chain_len >= self.window && chain_len % self.window == 0
    }

    /// Clamped ratio between expected and observed window duration.
    /// A window that took no time at all counts as infinitely fast.
    pub fn ratio(&self, actual_secs: i64) -> f64 {
        if actual_secs <= 0 {
            return MAX_ADJUST_RATIO;
        }
        let theoretical = (self.target_block_time_secs * self.window as u64) as f64;
        (theoretical / actual_secs as f64).clamp(MIN_ADJUST_RATIO, MAX_ADJUST_RATIO)
    }

    /// Difficulty for the next window given the boundary timestamps.
    pub fn next_difficulty(&self, current: f64, window_start: i64, window_end: i64) -> f64 {
        current * self.ratio(window_end - window_start)
    }

    /// Called right after a block is appended. Returns the difficulty to use
    /// from now on; unchanged unless `chain` just closed a window.
    pub fn adjust(&self, chain: &[Block], current: f64) -> f64 {
        let len = chain.len();
        if !self.is_due(len) {
            return current;
        }

        let first = chain[len - self.window].timestamp();
        let last = chain[len - 1].timestamp();
        let next = self.next_difficulty(current, first, last);
        info!(
            "DIFFICULTY - window closed at height {}: {:.4} -> {:.4} (took {}s, target {}s)",
            len - 1,
            current,
            next,
            last - first,
            self.target_block_time_secs * self.window as u64
        );
        next
    }
}
