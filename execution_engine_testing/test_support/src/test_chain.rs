//! The imperative chain facade tests drive.

use std::collections::BTreeSet;

use serde_json::Value;

use vellum_execution_engine::{
    execution::ExecutionEngine,
    state::GlobalState,
    system::{
        ClearCode, DeleteAuth, NewAccount, SetCode, UpdateAuth, CLEARCODE_ACTION,
        DELETEAUTH_ACTION, NEWACCOUNT_ACTION, SETCODE_ACTION, SYSTEM_ACCOUNT, UPDATEAUTH_ACTION,
    },
    BlockSummary, Error, LedgerState, TransactionReceipt,
};
use vellum_types::{Action, Authority, Name, PublicKey, Transaction};

use crate::{ActionBuilder, SandboxEngine, TestChainBuilder, DEFAULT_PUBLIC_KEY};

/// A single-chain test fixture.
///
/// Wraps a ledger instance and a set of signing keys that every pushed
/// transaction carries. The default fixture uses a [`SandboxEngine`]
/// and the default genesis accounts.
#[derive(Debug)]
pub struct TestChain<E: ExecutionEngine = SandboxEngine> {
    ledger: LedgerState<E>,
    signing_keys: BTreeSet<PublicKey>,
    error_receipts: bool,
}

impl TestChain<SandboxEngine> {
    /// Creates a chain with default configuration and engine.
    pub fn new() -> Self {
        TestChainBuilder::new().build()
    }

    /// Starts a builder for custom configuration or engine.
    pub fn builder() -> TestChainBuilder<SandboxEngine> {
        TestChainBuilder::new()
    }
}

impl Default for TestChain<SandboxEngine> {
    fn default() -> Self {
        TestChain::new()
    }
}

impl<E: ExecutionEngine> TestChain<E> {
    pub(crate) fn from_ledger(ledger: LedgerState<E>, error_receipts: bool) -> Self {
        let mut signing_keys = BTreeSet::new();
        signing_keys.insert(*DEFAULT_PUBLIC_KEY);
        TestChain {
            ledger,
            signing_keys,
            error_receipts,
        }
    }

    // With error receipts disabled, recoverable transaction failures
    // surface as `Err` like fatal ones do; the rollback already
    // happened either way.
    fn surface(&self, receipt: TransactionReceipt) -> Result<TransactionReceipt, Error> {
        match (&receipt.error, self.error_receipts) {
            (Some(error), false) => Err(error.clone()),
            _ => Ok(receipt),
        }
    }

    /// Adds a key to the set carried by every subsequent transaction.
    pub fn add_signing_key(&mut self, key: PublicKey) -> &mut Self {
        self.signing_keys.insert(key);
        self
    }

    /// Removes a key from the set carried by subsequent transactions.
    pub fn remove_signing_key(&mut self, key: &PublicKey) -> &mut Self {
        self.signing_keys.remove(key);
        self
    }

    /// Pushes one action authorized by `actor`'s `active` permission.
    pub fn push_action(
        &mut self,
        account: Name,
        name: Name,
        payload: Value,
        actor: Name,
    ) -> Result<TransactionReceipt, Error> {
        let action = ActionBuilder::new(account, name)
            .with_structured_payload(payload)
            .with_active_authorization(actor)
            .build();
        self.push_actions(vec![action])
    }

    /// Pushes several actions as one atomic transaction.
    pub fn push_actions(&mut self, actions: Vec<Action>) -> Result<TransactionReceipt, Error> {
        let transaction =
            Transaction::new(actions).with_signing_keys(self.signing_keys.iter().copied());
        let receipt = self.ledger.submit(transaction)?;
        self.surface(receipt)
    }

    /// Pushes a fully assembled transaction, leaving its signing keys
    /// untouched.
    pub fn push_transaction(
        &mut self,
        transaction: Transaction,
    ) -> Result<TransactionReceipt, Error> {
        let receipt = self.ledger.submit(transaction)?;
        self.surface(receipt)
    }

    /// Commits pending transactions into a block.
    pub fn produce_block(&mut self) -> Result<BlockSummary, Error> {
        self.ledger.produce_block()
    }

    /// Produces `count` consecutive blocks, returning the last summary.
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub fn produce_blocks(&mut self, count: u64) -> Result<BlockSummary, Error> {
        assert!(count > 0, "cannot produce zero blocks");
        let mut summary = self.ledger.produce_block()?;
        for _ in 1..count {
            summary = self.ledger.produce_block()?;
        }
        Ok(summary)
    }

    /// Deploys (or replaces) a contract on `account`, authorized by the
    /// account itself.
    pub fn deploy_contract(
        &mut self,
        account: Name,
        code: Vec<u8>,
        interface: &[u8],
    ) -> Result<TransactionReceipt, Error> {
        let payload = serde_json::to_value(SetCode {
            account: account.clone(),
            code,
            interface: interface.to_vec(),
        })
        .expect("setcode payload should serialize");
        self.push_action(
            SYSTEM_ACCOUNT.clone(),
            SETCODE_ACTION.clone(),
            payload,
            account,
        )
    }

    /// Undeploys the contract on `account`.
    pub fn undeploy_contract(&mut self, account: Name) -> Result<TransactionReceipt, Error> {
        let payload = serde_json::to_value(ClearCode {
            account: account.clone(),
        })
        .expect("clearcode payload should serialize");
        self.push_action(
            SYSTEM_ACCOUNT.clone(),
            CLEARCODE_ACTION.clone(),
            payload,
            account,
        )
    }

    /// Creates `name` with single-key `owner`/`active` permissions,
    /// authorized by `creator`.
    pub fn create_account(
        &mut self,
        creator: Name,
        name: Name,
        key: PublicKey,
    ) -> Result<TransactionReceipt, Error> {
        let payload = serde_json::to_value(NewAccount {
            creator: creator.clone(),
            name,
            owner: Authority::key(key),
            active: Authority::key(key),
        })
        .expect("newaccount payload should serialize");
        self.push_action(
            SYSTEM_ACCOUNT.clone(),
            NEWACCOUNT_ACTION.clone(),
            payload,
            creator,
        )
    }

    /// Creates or replaces `account`'s `permission`, authorized by the
    /// account itself.
    pub fn update_authority(
        &mut self,
        account: Name,
        permission: Name,
        parent: Option<Name>,
        auth: Authority,
    ) -> Result<TransactionReceipt, Error> {
        let payload = serde_json::to_value(UpdateAuth {
            account: account.clone(),
            permission,
            parent,
            auth,
        })
        .expect("updateauth payload should serialize");
        self.push_action(
            SYSTEM_ACCOUNT.clone(),
            UPDATEAUTH_ACTION.clone(),
            payload,
            account,
        )
    }

    /// Removes `account`'s `permission`, authorized by the account
    /// itself.
    pub fn delete_authority(
        &mut self,
        account: Name,
        permission: Name,
    ) -> Result<TransactionReceipt, Error> {
        let payload = serde_json::to_value(DeleteAuth {
            account: account.clone(),
            permission,
        })
        .expect("deleteauth payload should serialize");
        self.push_action(
            SYSTEM_ACCOUNT.clone(),
            DELETEAUTH_ACTION.clone(),
            payload,
            account,
        )
    }

    /// All rows of one table in the speculative state, in key order.
    pub fn query_table(&self, code: &Name, table: &Name) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.ledger
            .state()
            .tables()
            .rows(code, table)
            .map(|(key, value)| (key.to_vec(), value.to_vec()))
            .collect()
    }

    /// One row of one table in the speculative state.
    pub fn query_row(&self, code: &Name, table: &Name, key: &[u8]) -> Option<Vec<u8>> {
        self.ledger
            .state()
            .tables()
            .get(code, table, key)
            .map(<[u8]>::to_vec)
    }

    /// The speculative state: committed state plus pending effects.
    pub fn state(&self) -> &GlobalState {
        self.ledger.state()
    }

    /// The state as of the last produced block.
    pub fn committed_state(&self) -> &GlobalState {
        self.ledger.committed_state()
    }

    /// Height of the last produced block.
    pub fn height(&self) -> u64 {
        self.ledger.height()
    }

    /// Whether the chain has been torn down.
    pub fn is_closed(&self) -> bool {
        self.ledger.is_closed()
    }

    /// The underlying ledger, for assertions the facade does not cover.
    pub fn ledger(&self) -> &LedgerState<E> {
        &self.ledger
    }

    /// Tears the chain down. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        self.ledger.close();
    }
}

impl<E: ExecutionEngine> Drop for TestChain<E> {
    fn drop(&mut self) {
        self.ledger.close();
    }
}
