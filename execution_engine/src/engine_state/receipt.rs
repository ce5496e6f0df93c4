//! Receipts: the outcome records of applying actions, transactions and
//! blocks.

use std::time::Duration;

use vellum_types::Name;

use crate::engine_state::Error;

/// The outcome of one executed action.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ActionReceipt {
    /// The account whose contract (or the system) handled the action.
    pub receiver: Name,
    /// The action name.
    pub action: Name,
    /// Captured console output; empty unless console capture is
    /// enabled in the chain configuration.
    pub console: String,
    /// Execution time as reported by the engine.
    pub elapsed: Duration,
}

/// Whether a transaction was committed to the pending buffer or rolled
/// back.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum TransactionStatus {
    /// All actions applied; effects are buffered as pending.
    Executed,
    /// Some action failed; every effect was rolled back.
    Failed,
}

/// The outcome of applying a transaction.
///
/// On failure, `action_receipts` holds the receipts of the actions that
/// executed before the failing one (useful for console diagnostics);
/// their effects were rolled back with the rest of the transaction.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TransactionReceipt {
    /// Executed or failed.
    pub status: TransactionStatus,
    /// Per-action receipts.
    pub action_receipts: Vec<ActionReceipt>,
    /// The classified failure, when `status` is
    /// [`TransactionStatus::Failed`].
    pub error: Option<Error>,
}

impl TransactionReceipt {
    pub(crate) fn executed(action_receipts: Vec<ActionReceipt>) -> Self {
        TransactionReceipt {
            status: TransactionStatus::Executed,
            action_receipts,
            error: None,
        }
    }

    pub(crate) fn failed(action_receipts: Vec<ActionReceipt>, error: Error) -> Self {
        TransactionReceipt {
            status: TransactionStatus::Failed,
            action_receipts,
            error: Some(error),
        }
    }

    /// Whether the transaction executed successfully.
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Executed
    }

    /// Total execution time across all actions.
    pub fn elapsed(&self) -> Duration {
        self.action_receipts
            .iter()
            .map(|receipt| receipt.elapsed)
            .sum()
    }

    /// Concatenated console output of all actions.
    pub fn console(&self) -> String {
        self.action_receipts
            .iter()
            .map(|receipt| receipt.console.as_str())
            .collect()
    }

    /// Asserts success, panicking with the classified error otherwise.
    /// Intended for tests.
    pub fn expect_success(&self) -> &Self {
        if !self.is_success() {
            panic!(
                "expected successful transaction, got: {:?}",
                self.error
            );
        }
        self
    }

    /// Asserts failure, panicking if the transaction succeeded, and
    /// returns the classified error. Intended for tests.
    pub fn expect_failure(&self) -> &Error {
        match &self.error {
            Some(error) => error,
            None => panic!("expected failed transaction, got success"),
        }
    }
}

/// An immutable marker of committed state at a given height.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct BlockSummary {
    /// The height of the produced block.
    pub height: u64,
    /// How many pending transactions the block enclosed.
    pub transactions: usize,
}
