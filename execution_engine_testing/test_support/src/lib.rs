//! A library to support testing of contracts against the vellum
//! ledger.
//!
//! [`TestChain`] wraps a ledger instance behind an imperative facade:
//! push actions, produce blocks, deploy contracts and inspect table
//! state. The default execution engine is the in-process
//! [`SandboxEngine`], whose per-action behavior tests register as Rust
//! closures.

#![warn(missing_docs)]

mod chain_builder;
mod logging;
mod sandbox_engine;
mod test_chain;
mod transaction_builder;

use once_cell::sync::Lazy;

use vellum_execution_engine::{GenesisAccount, GenesisConfig};
use vellum_types::{Name, PublicKey, SecretKey};

pub use chain_builder::TestChainBuilder;
pub use logging::init_logging;
pub use sandbox_engine::{SandboxEngine, CODE_MAGIC};
pub use test_chain::TestChain;
pub use transaction_builder::{ActionBuilder, TransactionBuilder};

/// Default secret key, derived from a fixed seed.
pub static DEFAULT_SECRET_KEY: Lazy<SecretKey> =
    Lazy::new(|| SecretKey::ed25519_from_bytes([42; 32]));

/// Public counterpart of [`DEFAULT_SECRET_KEY`].
pub static DEFAULT_PUBLIC_KEY: Lazy<PublicKey> =
    Lazy::new(|| DEFAULT_SECRET_KEY.public_key());

/// A contract-hosting account present in the default genesis.
pub static ACCOUNT_HELLO: Lazy<Name> = Lazy::new(|| Name::new("hello").expect("valid name"));

/// A user account present in the default genesis.
pub static ACCOUNT_ALICE: Lazy<Name> = Lazy::new(|| Name::new("alice").expect("valid name"));

/// A user account present in the default genesis.
pub static ACCOUNT_BOB: Lazy<Name> = Lazy::new(|| Name::new("bob").expect("valid name"));

/// Default genesis configuration: the system account plus `hello`,
/// `alice` and `bob`, all controlled by [`DEFAULT_PUBLIC_KEY`].
pub static DEFAULT_GENESIS_CONFIG: Lazy<GenesisConfig> = Lazy::new(|| {
    GenesisConfig::new(
        *DEFAULT_PUBLIC_KEY,
        vec![
            GenesisAccount::new(ACCOUNT_HELLO.clone(), *DEFAULT_PUBLIC_KEY),
            GenesisAccount::new(ACCOUNT_ALICE.clone(), *DEFAULT_PUBLIC_KEY),
            GenesisAccount::new(ACCOUNT_BOB.clone(), *DEFAULT_PUBLIC_KEY),
        ],
    )
});
