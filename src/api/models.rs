use std::sync::Arc;

use serde::Serialize;

use crate::blockchain::{ChainLedger, MinerId};

/// Shared application state: the one ledger every miner and handler uses.
pub struct AppState {
    pub ledger: Arc<ChainLedger>,
}

impl AppState {
    pub fn new(ledger: Arc<ChainLedger>) -> Self {
        Self { ledger }
    }
}

/* ---------- Network API Models ---------- */

#[derive(Serialize)]
pub struct AddMinerResponse {
    pub message: &'static str,
    pub id: MinerId,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: f64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: f64,
    pub effective_bits: u32,
    pub target_block_time_secs: u64,
    pub adjust_window: usize,
    pub last_interval_secs: Option<i64>,
    pub miners: usize,
    pub block_reward: u64,
    pub total_rewards: u64,
}
