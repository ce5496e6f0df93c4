//! All possible outcomes of operations on a [`LedgerState`] instance.
//!
//! [`LedgerState`]: super::LedgerState

use thiserror::Error;

use vellum_types::{interface::InterfaceError, Name};

use crate::{
    authority::{AuthorizationError, StructureError},
    engine_state::genesis::GenesisError,
};

/// Ledger errors.
///
/// Structural and validation errors are recovered at the transaction
/// boundary: they roll back that transaction only. Genesis errors and
/// fatal engine faults terminate the harness instance; see
/// [`Error::is_fatal`].
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum Error {
    /// Malformed account, permission or transaction structure.
    #[error("invalid structure: {0}")]
    InvalidStructure(#[from] StructureError),
    /// The engine rejected contract bytes at deploy time.
    #[error("invalid contract code: {0}")]
    InvalidCode(String),
    /// The target account has no deployed contract.
    #[error("no contract deployed on account {0}")]
    NoSuchContract(Name),
    /// A structured payload did not resolve against the target's
    /// interface description.
    #[error("payload decode error: {0}")]
    PayloadDecode(#[from] InterfaceError),
    /// A required authorization was not satisfied.
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    /// The engine reported a business-logic failure.
    #[error("execution failure: {0}")]
    Execution(String),
    /// The harness was torn down; no further operations are accepted.
    #[error("harness closed")]
    HarnessClosed,
    /// The engine reported an unrecoverable fault; the harness is
    /// forced into the torn-down state.
    #[error("fatal engine fault: {0}")]
    FatalEngineFault(String),
    /// Genesis setup failed; no partial harness exists.
    #[error("genesis error: {0}")]
    Genesis(Box<GenesisError>),
}

impl Error {
    /// Whether this error terminates the harness instance rather than
    /// just the enclosing transaction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::FatalEngineFault(_) | Error::Genesis(_))
    }
}

impl From<GenesisError> for Error {
    fn from(error: GenesisError) -> Self {
        Error::Genesis(Box::new(error))
    }
}
