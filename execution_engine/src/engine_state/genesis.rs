//! Genesis configuration and installation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vellum_types::{Authority, Name, PublicKey};

use crate::{authority::StructureError, state::GlobalState, system::SYSTEM_ACCOUNT};

/// An account created at genesis, keyed by a single public key for both
/// its `owner` and `active` permissions.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct GenesisAccount {
    /// The account name.
    pub name: Name,
    /// The key controlling both default permissions.
    pub key: PublicKey,
}

impl GenesisAccount {
    /// Constructs a genesis account.
    pub fn new(name: Name, key: PublicKey) -> Self {
        GenesisAccount { name, key }
    }
}

/// Everything needed to establish the genesis state: the system
/// account's key material and the initial set of user accounts.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Key controlling the system account.
    pub system_key: PublicKey,
    /// Accounts created at genesis besides the system account.
    pub accounts: Vec<GenesisAccount>,
}

impl GenesisConfig {
    /// Constructs a genesis configuration.
    pub fn new(system_key: PublicKey, accounts: Vec<GenesisAccount>) -> Self {
        GenesisConfig {
            system_key,
            accounts,
        }
    }
}

/// Reasons genesis setup can fail. All of them are fatal: there is no
/// partial harness.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum GenesisError {
    /// The same account name appeared twice.
    #[error("duplicate genesis account: {0}")]
    DuplicateAccount(Name),
    /// A genesis account tried to use the system account's name.
    #[error("reserved account name: {0}")]
    ReservedName(Name),
    /// Account or permission creation failed structurally.
    #[error(transparent)]
    Structure(#[from] StructureError),
}

/// Builds the genesis global state: the system account plus every
/// configured account, each with single-key `owner`/`active`
/// permissions.
pub(crate) fn install(config: &GenesisConfig) -> Result<GlobalState, GenesisError> {
    let mut state = GlobalState::default();
    state.auth.create_account(
        SYSTEM_ACCOUNT.clone(),
        Authority::key(config.system_key),
        Authority::key(config.system_key),
    )?;
    for account in &config.accounts {
        if account.name == *SYSTEM_ACCOUNT {
            return Err(GenesisError::ReservedName(account.name.clone()));
        }
        if state.auth.account_exists(&account.name) {
            return Err(GenesisError::DuplicateAccount(account.name.clone()));
        }
        state.auth.create_account(
            account.name.clone(),
            Authority::key(account.key),
            Authority::key(account.key),
        )?;
    }
    Ok(state)
}
