//! Builder for [`TestChain`] instances.

use vellum_execution_engine::{
    engine_state::{DEFAULT_CONTRACTS_CONSOLE, DEFAULT_MAX_AUTH_DEPTH, DEFAULT_MAX_CONSOLE_BYTES},
    execution::ExecutionEngine,
    ChainConfig, GenesisAccount, GenesisConfig, LedgerState,
};
use vellum_types::{Name, PublicKey};

use crate::{test_chain::TestChain, SandboxEngine, DEFAULT_GENESIS_CONFIG};

/// Builds a [`TestChain`] with custom configuration or engine.
#[derive(Debug)]
pub struct TestChainBuilder<E = SandboxEngine> {
    engine: E,
    contracts_console: bool,
    max_auth_depth: u32,
    max_console_bytes: usize,
    genesis: GenesisConfig,
    error_receipts: bool,
}

impl TestChainBuilder<SandboxEngine> {
    /// Starts a builder with a fresh [`SandboxEngine`] and the default
    /// genesis configuration.
    pub fn new() -> Self {
        TestChainBuilder::with_engine(SandboxEngine::new())
    }
}

impl Default for TestChainBuilder<SandboxEngine> {
    fn default() -> Self {
        TestChainBuilder::new()
    }
}

impl<E: ExecutionEngine> TestChainBuilder<E> {
    /// Starts a builder around a custom execution engine.
    pub fn with_engine(engine: E) -> Self {
        TestChainBuilder {
            engine,
            contracts_console: DEFAULT_CONTRACTS_CONSOLE,
            max_auth_depth: DEFAULT_MAX_AUTH_DEPTH,
            max_console_bytes: DEFAULT_MAX_CONSOLE_BYTES,
            genesis: DEFAULT_GENESIS_CONFIG.clone(),
            error_receipts: true,
        }
    }

    /// Selects how recoverable transaction failures surface: as failed
    /// receipts (the default) or as `Err` results.
    pub fn with_error_receipts(mut self, enabled: bool) -> Self {
        self.error_receipts = enabled;
        self
    }

    /// Enables or disables console capture.
    pub fn with_contracts_console(mut self, enabled: bool) -> Self {
        self.contracts_console = enabled;
        self
    }

    /// Sets the authorization recursion depth limit.
    pub fn with_max_auth_depth(mut self, depth: u32) -> Self {
        self.max_auth_depth = depth;
        self
    }

    /// Sets the per-action console size limit.
    pub fn with_max_console_bytes(mut self, limit: usize) -> Self {
        self.max_console_bytes = limit;
        self
    }

    /// Replaces the genesis configuration wholesale.
    pub fn with_genesis(mut self, genesis: GenesisConfig) -> Self {
        self.genesis = genesis;
        self
    }

    /// Adds one account to the genesis configuration.
    pub fn with_genesis_account(mut self, name: Name, key: PublicKey) -> Self {
        self.genesis.accounts.push(GenesisAccount::new(name, key));
        self
    }

    /// Establishes genesis and returns a ready chain.
    ///
    /// Panics if genesis fails; a test with a broken genesis
    /// configuration cannot proceed.
    pub fn build(self) -> TestChain<E> {
        let config = ChainConfig::new(
            self.contracts_console,
            self.max_auth_depth,
            self.max_console_bytes,
        );
        let ledger = LedgerState::new(config, &self.genesis, self.engine)
            .expect("genesis installation should succeed");
        TestChain::from_ledger(ledger, self.error_receipts)
    }
}
