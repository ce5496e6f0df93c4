//! In-memory chain state and its snapshot model.

use std::collections::BTreeMap;

use vellum_types::Name;

use crate::{authority::AuthorityRegistry, contracts::ContractRegistry};

/// Contract table storage: rows keyed by `(code account, table, key)`.
///
/// The execution engine reads and writes rows through its context
/// callbacks; the harness itself never interprets row contents.
#[derive(Clone, Debug, Default)]
pub struct TableStore {
    tables: BTreeMap<(Name, Name), BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl TableStore {
    /// Reads a row.
    pub fn get(&self, code: &Name, table: &Name, key: &[u8]) -> Option<&[u8]> {
        self.tables
            .get(&(code.clone(), table.clone()))
            .and_then(|rows| rows.get(key))
            .map(Vec::as_slice)
    }

    /// Writes a row, replacing any previous value.
    pub fn set(&mut self, code: Name, table: Name, key: Vec<u8>, value: Vec<u8>) {
        self.tables
            .entry((code, table))
            .or_default()
            .insert(key, value);
    }

    /// Removes a row, returning the previous value if present.
    pub fn erase(&mut self, code: &Name, table: &Name, key: &[u8]) -> Option<Vec<u8>> {
        let scope = self.tables.get_mut(&(code.clone(), table.clone()))?;
        let previous = scope.remove(key);
        if scope.is_empty() {
            self.tables.remove(&(code.clone(), table.clone()));
        }
        previous
    }

    /// Iterates the rows of one table in key order.
    pub fn rows<'a>(
        &'a self,
        code: &Name,
        table: &Name,
    ) -> impl Iterator<Item = (&'a [u8], &'a [u8])> + 'a {
        self.tables
            .get(&(code.clone(), table.clone()))
            .into_iter()
            .flat_map(|rows| rows.iter().map(|(key, value)| (key.as_slice(), value.as_slice())))
    }

    /// Returns whether the store holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// The complete mutable chain state: accounts and permissions,
/// deployed contracts, and contract tables.
///
/// Cloneable as a unit; the ledger controller keeps a committed and a
/// speculative snapshot and implements transaction rollback by
/// restoring a pre-transaction clone.
#[derive(Clone, Debug, Default)]
pub struct GlobalState {
    /// Account and permission registry.
    pub(crate) auth: AuthorityRegistry,
    /// Contract registry.
    pub(crate) contracts: ContractRegistry,
    /// Contract table storage.
    pub(crate) tables: TableStore,
}

impl GlobalState {
    /// Read access to the account and permission registry.
    pub fn auth(&self) -> &AuthorityRegistry {
        &self.auth
    }

    /// Read access to the contract registry.
    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    /// Read access to contract table storage.
    pub fn tables(&self) -> &TableStore {
        &self.tables
    }
}
