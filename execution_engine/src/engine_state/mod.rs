//! The ledger controller: the top-level lifecycle of one harness
//! instance.
//!
//! A [`LedgerState`] owns the chain configuration, the execution engine
//! and two copies of the global state. Transactions apply against the
//! speculative copy; `produce_block` promotes it to the committed copy
//! and advances the height. A failed transaction restores the
//! speculative copy from a per-transaction checkpoint, so a transaction
//! is always all-or-nothing.

mod dispatch;
pub mod engine_config;
mod error;
pub mod genesis;
mod receipt;

use tracing::{debug, info, warn};

use vellum_types::Transaction;

use crate::{authority::StructureError, execution::ExecutionEngine, state::GlobalState};

pub use engine_config::{
    ChainConfig, DEFAULT_CONTRACTS_CONSOLE, DEFAULT_MAX_AUTH_DEPTH, DEFAULT_MAX_CONSOLE_BYTES,
};
pub use error::Error;
pub use genesis::{GenesisAccount, GenesisConfig, GenesisError};
pub use receipt::{ActionReceipt, BlockSummary, TransactionReceipt, TransactionStatus};

/// Lifecycle phase of a [`LedgerState`].
///
/// `Producing` is never observable through the public API; block
/// production runs to completion within `produce_block`.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
enum Phase {
    Ready,
    Producing,
    TornDown,
}

/// A single deterministic ledger instance.
///
/// All operations are synchronous; callers wanting parallel test cases
/// create independent instances.
#[derive(Debug)]
pub struct LedgerState<E> {
    config: ChainConfig,
    engine: Option<E>,
    committed: GlobalState,
    speculative: GlobalState,
    height: u64,
    pending: Vec<TransactionReceipt>,
    phase: Phase,
}

impl<E: ExecutionEngine> LedgerState<E> {
    /// Establishes the genesis state and returns a ready instance at
    /// height zero.
    ///
    /// Genesis failure is fatal; no partial instance exists afterwards.
    pub fn new(config: ChainConfig, genesis: &GenesisConfig, engine: E) -> Result<Self, Error> {
        let state = genesis::install(genesis)?;
        info!(accounts = genesis.accounts.len() + 1, "genesis installed");
        Ok(LedgerState {
            config,
            engine: Some(engine),
            committed: state.clone(),
            speculative: state,
            height: 0,
            pending: Vec::new(),
            phase: Phase::Ready,
        })
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        match self.phase {
            Phase::Ready => Ok(()),
            Phase::Producing | Phase::TornDown => Err(Error::HarnessClosed),
        }
    }

    /// Applies a transaction against the speculative state.
    ///
    /// All actions apply in declaration order. If any action fails with
    /// a recoverable error, the whole transaction is rolled back and a
    /// failed receipt is returned; the previous speculative state is
    /// byte-for-byte restored and the pending buffer is left untouched,
    /// so a failed transaction never appears in a produced block. A
    /// fatal engine fault tears the instance down and is returned as
    /// `Err`.
    ///
    /// An empty transaction is malformed and is rejected without a
    /// receipt.
    pub fn submit(&mut self, transaction: Transaction) -> Result<TransactionReceipt, Error> {
        self.ensure_ready()?;
        if transaction.actions.is_empty() {
            return Err(StructureError::EmptyTransaction.into());
        }
        let engine = self
            .engine
            .as_mut()
            .ok_or(Error::HarnessClosed)?;

        let checkpoint = self.speculative.clone();
        let mut action_receipts = Vec::with_capacity(transaction.actions.len());
        for action in &transaction.actions {
            match dispatch::dispatch_action(
                &self.config,
                &mut self.speculative,
                engine,
                action,
                &transaction.signing_keys,
            ) {
                Ok(receipt) => action_receipts.push(receipt),
                Err(error) => {
                    self.speculative = checkpoint;
                    if error.is_fatal() {
                        warn!(%error, "fatal engine fault, tearing down");
                        self.close();
                        return Err(error);
                    }
                    debug!(%error, "transaction rolled back");
                    return Ok(TransactionReceipt::failed(action_receipts, error));
                }
            }
        }
        debug!(actions = action_receipts.len(), "transaction applied");
        let receipt = TransactionReceipt::executed(action_receipts);
        self.pending.push(receipt.clone());
        Ok(receipt)
    }

    /// Commits the speculative state and advances the height by one.
    ///
    /// Producing with no pending transactions is valid and still
    /// advances the height; repeated empty production is idempotent in
    /// every respect but the height.
    pub fn produce_block(&mut self) -> Result<BlockSummary, Error> {
        self.ensure_ready()?;
        self.phase = Phase::Producing;
        self.committed = self.speculative.clone();
        let transactions = self.pending.len();
        self.pending.clear();
        self.height += 1;
        self.phase = Phase::Ready;
        debug!(height = self.height, transactions, "block produced");
        Ok(BlockSummary {
            height: self.height,
            transactions,
        })
    }

    /// Tears the instance down, releasing the engine and all state.
    ///
    /// Valid in any phase and idempotent. Every subsequent operation
    /// reports [`Error::HarnessClosed`].
    pub fn close(&mut self) {
        if self.phase == Phase::TornDown {
            return;
        }
        self.engine = None;
        self.committed = GlobalState::default();
        self.speculative = GlobalState::default();
        self.pending.clear();
        self.phase = Phase::TornDown;
        info!(height = self.height, "harness torn down");
    }

    /// Whether the instance has been torn down.
    pub fn is_closed(&self) -> bool {
        self.phase == Phase::TornDown
    }

    /// Height of the last produced block; zero before any production.
    pub fn height(&self) -> u64 {
        self.height
    }

    /// The chain configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The speculative state: committed state plus all pending
    /// transactions.
    pub fn state(&self) -> &GlobalState {
        &self.speculative
    }

    /// The state as of the last produced block.
    pub fn committed_state(&self) -> &GlobalState {
        &self.committed
    }

    /// Receipts of the transactions applied since the last block.
    pub fn pending_transactions(&self) -> &[TransactionReceipt] {
        &self.pending
    }
}
