//! The vellum execution engine: a deterministic, single-node ledger
//! core for testing smart contracts.
//!
//! The crate reproduces enough of a real ledger's execution semantics
//! to give trustworthy pass/fail results: an account/permission model
//! with weighted thresholds and delegation, a contract registry with
//! atomic deploy/replace, an action dispatcher, and a ledger controller
//! with explicit block production. Contract business logic itself is
//! delegated to an external VM through the
//! [`ExecutionEngine`](execution::ExecutionEngine) trait; the harness
//! only observes its results.
//!
//! Everything is synchronous and single-threaded. One
//! [`LedgerState`](engine_state::LedgerState) instance owns its
//! registries exclusively; hosts wanting parallel test cases create
//! independent instances.

#![warn(missing_docs)]

pub mod authority;
pub mod contracts;
pub mod engine_state;
pub mod execution;
pub mod state;
pub mod system;

pub use engine_state::{
    BlockSummary, ChainConfig, Error, GenesisAccount, GenesisConfig, GenesisError, LedgerState,
    TransactionReceipt, TransactionStatus,
};
