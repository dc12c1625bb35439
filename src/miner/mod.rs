use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use log::{debug, trace};

use crate::blockchain::pow::{SearchOutcome, search};
use crate::blockchain::{Block, ChainLedger, MinerId};

/// How one template/search/submit cycle ended for a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// Our block made it into the chain.
    Sealed,
    /// A peer got there first, or the nonce space ran out.
    Missed,
    /// The ledger is gone; there is nothing left to mine on.
    Detached,
}

/// One miner's loop: template, search, submit, repeat.
///
/// The worker only holds a weak reference to the ledger, so it keeps going for
/// as long as somebody else keeps the ledger alive.
pub struct MinerWorker {
    id: MinerId,
    ledger: Weak<ChainLedger>,
    signals: Receiver<()>,
    round: u64,
}

impl MinerWorker {
    pub fn new(id: MinerId, ledger: &Arc<ChainLedger>, signals: Receiver<()>) -> Self {
        Self {
            id,
            ledger: Arc::downgrade(ledger),
            signals,
            round: 0,
        }
    }

    /// Run the worker on its own named thread until the ledger is dropped.
    pub fn spawn(mut self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("miner-{}", self.id))
            .spawn(move || {
                while self.step() != Round::Detached {}
                debug!("miner {} stopped: ledger dropped", self.id);
            })
    }

    pub fn step(&mut self) -> Round {
        // Tokens received so far refer to tips the next template already sees.
        while self.signals.try_recv().is_ok() {}

        let header = {
            let Some(ledger) = self.ledger.upgrade() else {
                return Round::Detached;
            };
            let payload = format!("simulated block data:{}:{}", self.id, self.round).into_bytes();
            ledger.assemble_header(self.id, payload)
        };

        // A closed mailbox means the ledger went away mid-search.
        let signals = &self.signals;
        let outcome = search(&header, || {
            !matches!(signals.try_recv(), Err(TryRecvError::Empty))
        });

        match outcome {
            SearchOutcome::Found(block) => self.submit(block),
            SearchOutcome::Cancelled => {
                trace!("miner {} cancelled, re-templating", self.id);
                Round::Missed
            }
            SearchOutcome::Exhausted => {
                debug!("miner {} exhausted the nonce space", self.id);
                Round::Missed
            }
        }
    }

    /// Hand a solved block to the ledger. The round advances whether or not
    /// the block is accepted.
    fn submit(&mut self, block: Block) -> Round {
        self.round += 1;
        let Some(ledger) = self.ledger.upgrade() else {
            return Round::Detached;
        };
        if ledger.add_block(block) {
            Round::Sealed
        } else {
            trace!("miner {} lost the race for its block", self.id);
            Round::Missed
        }
    }
}
