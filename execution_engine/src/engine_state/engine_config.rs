//! Runtime configuration of a ledger instance.
//!
//! A [`ChainConfig`] is passed at harness construction and never
//! mutated while the harness is live; there is no process-wide
//! configuration singleton.

/// Default for whether contract console output is captured in receipts.
pub const DEFAULT_CONTRACTS_CONSOLE: bool = false;
/// Default bound on delegation recursion during authorization checks.
pub const DEFAULT_MAX_AUTH_DEPTH: u32 = 4;
/// Default cap on captured console output per action, in bytes.
pub const DEFAULT_MAX_CONSOLE_BYTES: usize = 16 * 1024;

/// The runtime configuration of a ledger instance.
#[derive(Debug, Copy, Clone)]
pub struct ChainConfig {
    contracts_console: bool,
    max_auth_depth: u32,
    max_console_bytes: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        ChainConfig {
            contracts_console: DEFAULT_CONTRACTS_CONSOLE,
            max_auth_depth: DEFAULT_MAX_AUTH_DEPTH,
            max_console_bytes: DEFAULT_MAX_CONSOLE_BYTES,
        }
    }
}

impl ChainConfig {
    /// Creates a new configuration with the provided parameters.
    pub fn new(contracts_console: bool, max_auth_depth: u32, max_console_bytes: usize) -> Self {
        ChainConfig {
            contracts_console,
            max_auth_depth,
            max_console_bytes,
        }
    }

    /// Whether contract console output is captured in receipts.
    pub fn contracts_console(&self) -> bool {
        self.contracts_console
    }

    /// Bound on delegation recursion during authorization checks.
    pub fn max_auth_depth(&self) -> u32 {
        self.max_auth_depth
    }

    /// Cap on captured console output per action, in bytes.
    pub fn max_console_bytes(&self) -> usize {
        self.max_console_bytes
    }
}
