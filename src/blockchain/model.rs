use std::io;
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use log::{debug, info};
use serde::Serialize;

use super::block::{Block, Header, MinerId, effective_bits};
use super::difficulty::DifficultyController;
use crate::config::NetworkConfig;
use crate::miner::MinerWorker;

/// Registry entry for one miner. The sender is the miner's single-slot
/// cancellation mailbox.
#[derive(Debug)]
struct MinerRecord {
    id: MinerId,
    balance: u64,
    cancel: SyncSender<()>,
}

/// Public view of a miner, as returned by snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinerAccount {
    pub id: MinerId,
    pub balance: u64,
}

/// Owned copy of the ledger at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSnapshot {
    pub blocks: Vec<Block>,
    pub miners: Vec<MinerAccount>,
    #[serde(skip)]
    pub difficulty: f64,
}

#[derive(Debug)]
struct LedgerState {
    chain: Vec<Block>,
    difficulty: f64,
    miners: Vec<MinerRecord>,
}

impl LedgerState {
    fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Why `block` cannot extend the current tip, if it cannot.
    fn rejection(&self, block: &Block) -> Option<&'static str> {
        if effective_bits(block.header.target_bits) != effective_bits(self.difficulty) {
            return Some("wrong difficulty");
        }
        if block.header.prev_hash.as_slice() != self.last_block().hash() {
            return Some("stale previous hash");
        }
        if block.header.coinbase as usize >= self.miners.len() {
            return Some("unknown coinbase");
        }
        if !block.is_valid() {
            return Some("proof does not meet target");
        }
        None
    }

    fn credit(&mut self, miner: MinerId, amount: u64) {
        if let Some(record) = self.miners.get_mut(miner as usize) {
            record.balance = record.balance.saturating_add(amount);
        }
    }

    /// Tell every miner but `winner` that the tip moved. Never blocks: a full
    /// mailbox already holds an equivalent token.
    fn broadcast_except(&self, winner: MinerId) {
        for record in self.miners.iter().filter(|m| m.id != winner) {
            match record.cancel.try_send(()) {
                Ok(()) | Err(TrySendError::Full(())) => {}
                Err(TrySendError::Disconnected(())) => {
                    debug!("miner {} has no listening worker", record.id);
                }
            }
        }
    }
}

/// The shared chain: blocks, current difficulty and the miner registry,
/// all behind one read/write lock. Every mutation of consensus state goes
/// through `add_block` or `register_miner`.
#[derive(Debug)]
pub struct ChainLedger {
    state: RwLock<LedgerState>,
    retarget: DifficultyController,
    block_reward: u64,
}

impl ChainLedger {
    /// Initialize a new ledger with a genesis block and no miners.
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            state: RwLock::new(LedgerState {
                chain: vec![Block::genesis()],
                difficulty: config.initial_difficulty,
                miners: Vec::new(),
            }),
            retarget: DifficultyController::new(
                config.adjust_window,
                config.target_block_time_secs,
            ),
            block_reward: config.block_reward,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerState> {
        self.state.read().expect("rwlock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerState> {
        self.state.write().expect("rwlock poisoned")
    }

    /// Build a mining template on top of the current tip.
    pub fn assemble_header(&self, miner: MinerId, payload: Vec<u8>) -> Header {
        let state = self.read();
        let tip = state.last_block();
        Header {
            coinbase: miner,
            timestamp: Utc::now().timestamp(),
            payload,
            prev_hash: tip.hash().to_vec(),
            prev_hash_hex: tip.proof.hash_hex.clone(),
            target_bits: state.difficulty,
        }
    }

    /// Try to append a sealed block. Returns `false`, with no side effect,
    /// when the block does not extend the current tip at the current
    /// difficulty; losers of a race end up here.
    pub fn add_block(&self, candidate: Block) -> bool {
        let mut state = self.write();
        let block = candidate.stamped(Utc::now().timestamp());

        if let Some(reason) = state.rejection(&block) {
            debug!(
                "REJECT - block {} from miner {}: {}",
                block.proof.hash_hex, block.header.coinbase, reason
            );
            return false;
        }

        let winner = block.header.coinbase;
        let hash_hex = block.proof.hash_hex.clone();
        state.chain.push(block);

        let next = self.retarget.adjust(&state.chain, state.difficulty);
        state.difficulty = next;
        state.credit(winner, self.block_reward);
        state.broadcast_except(winner);

        info!(
            "MINER - miner {} sealed block #{} {}",
            winner,
            state.chain.len() - 1,
            hash_hex
        );
        true
    }

    /// Register a miner and start its worker thread.
    pub fn register_miner(self: &Arc<Self>) -> io::Result<MinerId> {
        let id = self.register_with(|id, signals| {
            MinerWorker::new(id, self, signals).spawn().map(drop)
        })?;
        info!("MINER - miner {} joined the network", id);
        Ok(id)
    }

    /// Reserve the next id and its mailbox, then hand both to `start`. The
    /// record is only added once `start` succeeds, so a failed start uses up
    /// no id.
    fn register_with<F>(&self, start: F) -> io::Result<MinerId>
    where
        F: FnOnce(MinerId, Receiver<()>) -> io::Result<()>,
    {
        let mut state = self.write();
        let id = state.miners.len() as MinerId;
        let (cancel, signals) = sync_channel(1);
        start(id, signals)?;
        state.miners.push(MinerRecord {
            id,
            balance: 0,
            cancel,
        });
        Ok(id)
    }

    /// Register a miner without a worker; the caller drives its mailbox.
    #[cfg(test)]
    pub fn enroll(&self) -> (MinerId, Receiver<()>) {
        let mut mailbox = None;
        let id = self
            .register_with(|_, signals| {
                mailbox = Some(signals);
                Ok(())
            })
            .expect("enrolling starts nothing");
        (id, mailbox.expect("mailbox handed over"))
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        let state = self.read();
        ChainSnapshot {
            blocks: state.chain.clone(),
            miners: state
                .miners
                .iter()
                .map(|m| MinerAccount {
                    id: m.id,
                    balance: m.balance,
                })
                .collect(),
            difficulty: state.difficulty,
        }
    }

    pub fn len(&self) -> usize {
        self.read().chain.len()
    }

    pub fn difficulty(&self) -> f64 {
        self.read().difficulty
    }

    pub fn miner_count(&self) -> usize {
        self.read().miners.len()
    }

    pub fn block_reward(&self) -> u64 {
        self.block_reward
    }

    pub fn retarget(&self) -> &DifficultyController {
        &self.retarget
    }

    /// Return a copy of the last block in the chain.
    #[cfg(test)]
    pub fn last_block(&self) -> Block {
        self.read().last_block().clone()
    }

    /// Validate the entire chain: genesis, linkage and every proof.
    pub fn is_valid_chain(&self) -> bool {
        let state = self.read();
        let Some(genesis) = state.chain.first() else {
            return false;
        };
        if !genesis.is_genesis() {
            return false;
        }

        state.chain.windows(2).all(|pair| {
            let (prev, current) = (&pair[0], &pair[1]);
            current.header.prev_hash.as_slice() == prev.hash() && current.is_valid()
        })
    }
}
