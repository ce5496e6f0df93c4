//! The seam between the harness and the external bytecode VM.
//!
//! The harness delegates all contract business logic to an
//! [`ExecutionEngine`] implementation and only observes results. The
//! engine is the sole authority on business-logic success or failure
//! and on resource accounting; the dispatcher never second-guesses it.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use vellum_types::{Name, PermissionLevel};

use crate::{engine_state::ChainConfig, state::TableStore};

/// A failure reported by the execution engine.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum EngineFault {
    /// Business-logic failure. Recoverable: rolls back the enclosing
    /// transaction and leaves the harness usable.
    #[error("{0}")]
    Revert(String),
    /// Unrecoverable engine fault. Forces the harness into the
    /// torn-down state.
    #[error("fatal engine fault: {0}")]
    Fatal(String),
}

impl EngineFault {
    /// A recoverable business-logic failure.
    pub fn revert(message: impl Into<String>) -> Self {
        EngineFault::Revert(message.into())
    }

    /// An unrecoverable engine fault.
    pub fn fatal(message: impl Into<String>) -> Self {
        EngineFault::Fatal(message.into())
    }
}

/// What the engine reports back after executing an action.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct ExecutionOutcome {
    /// Execution time as measured by the engine.
    pub elapsed: Duration,
}

/// The per-action view the engine executes against: the action's
/// identity and payload, the satisfied authorizations, console capture,
/// and table storage callbacks.
///
/// Table writes land in the speculative chain state and are rolled back
/// with the enclosing transaction on failure.
pub struct ExecutionContext<'a> {
    receiver: Name,
    action: Name,
    data: &'a [u8],
    args: Option<&'a Value>,
    authorization: &'a [PermissionLevel],
    tables: &'a mut TableStore,
    console: String,
    console_enabled: bool,
    max_console_bytes: usize,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        config: &ChainConfig,
        receiver: Name,
        action: Name,
        data: &'a [u8],
        args: Option<&'a Value>,
        authorization: &'a [PermissionLevel],
        tables: &'a mut TableStore,
    ) -> Self {
        ExecutionContext {
            receiver,
            action,
            data,
            args,
            authorization,
            tables,
            console: String::new(),
            console_enabled: config.contracts_console(),
            max_console_bytes: config.max_console_bytes(),
        }
    }

    /// The account whose contract is executing.
    pub fn receiver(&self) -> &Name {
        &self.receiver
    }

    /// The action being executed.
    pub fn action(&self) -> &Name {
        &self.action
    }

    /// The canonical payload bytes (decoded for structured payloads,
    /// verbatim for raw ones).
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// The structured payload, when the action carried one.
    pub fn args(&self) -> Option<&Value> {
        self.args
    }

    /// The authorizations declared on the action, all satisfied.
    pub fn authorization(&self) -> &[PermissionLevel] {
        self.authorization
    }

    /// Returns whether the action carries an authorization of `actor`.
    pub fn has_authorization(&self, actor: &Name) -> bool {
        self.authorization.iter().any(|level| &level.actor == actor)
    }

    /// Fails the action unless it carries an authorization of `actor`.
    pub fn require_authorization(&self, actor: &Name) -> Result<(), EngineFault> {
        if self.has_authorization(actor) {
            Ok(())
        } else {
            Err(EngineFault::revert(format!(
                "missing required authority of {}",
                actor
            )))
        }
    }

    /// Appends a line to the action's console output. A no-op unless
    /// console capture is enabled; output is truncated at the
    /// configured limit.
    pub fn print(&mut self, message: &str) {
        if !self.console_enabled {
            return;
        }
        let remaining = self.max_console_bytes.saturating_sub(self.console.len());
        if remaining == 0 {
            return;
        }
        let mut take = remaining.min(message.len());
        while !message.is_char_boundary(take) {
            take -= 1;
        }
        self.console.push_str(&message[..take]);
    }

    /// Reads a row from any contract's table.
    pub fn get_row(&self, code: &Name, table: &Name, key: &[u8]) -> Option<Vec<u8>> {
        self.tables.get(code, table, key).map(<[u8]>::to_vec)
    }

    /// Writes a row in the executing contract's own scope.
    pub fn set_row(&mut self, table: Name, key: Vec<u8>, value: Vec<u8>) {
        self.tables.set(self.receiver.clone(), table, key, value);
    }

    /// Removes a row from the executing contract's own scope.
    pub fn erase_row(&mut self, table: &Name, key: &[u8]) -> Option<Vec<u8>> {
        let receiver = self.receiver.clone();
        self.tables.erase(&receiver, table, key)
    }

    pub(crate) fn take_console(&mut self) -> String {
        std::mem::take(&mut self.console)
    }
}

/// An external bytecode VM, consumed through a narrow synchronous
/// interface.
///
/// Implementations own business semantics and resource accounting. A
/// hung `execute` call is an unrecoverable condition for the harness
/// instance; there is no timeout or retry model.
pub trait ExecutionEngine {
    /// Checks that `code` can be loaded by the engine. Called before a
    /// deployment replaces the contract registry entry.
    fn validate_code(&self, code: &[u8]) -> Result<(), EngineFault>;

    /// Executes one action against `context`.
    fn execute(&mut self, context: &mut ExecutionContext<'_>)
        -> Result<ExecutionOutcome, EngineFault>;
}

impl<T: ExecutionEngine + ?Sized> ExecutionEngine for Box<T> {
    fn validate_code(&self, code: &[u8]) -> Result<(), EngineFault> {
        (**self).validate_code(code)
    }

    fn execute(
        &mut self,
        context: &mut ExecutionContext<'_>,
    ) -> Result<ExecutionOutcome, EngineFault> {
        (**self).execute(context)
    }
}
