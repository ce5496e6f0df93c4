//! Builders assembling actions and transactions for submission.

use serde_json::Value;

use vellum_execution_engine::authority::ACTIVE_PERMISSION;
use vellum_types::{Action, ActionPayload, Name, PermissionLevel, PublicKey, Transaction};

/// Builds an [`Action`].
#[derive(Clone, Debug)]
pub struct ActionBuilder {
    account: Name,
    name: Name,
    payload: ActionPayload,
    authorization: Vec<PermissionLevel>,
}

impl ActionBuilder {
    /// Starts an action targeting `name` on `account`, with an empty
    /// payload and no authorizations.
    pub fn new(account: Name, name: Name) -> Self {
        ActionBuilder {
            account,
            name,
            payload: ActionPayload::empty(),
            authorization: Vec::new(),
        }
    }

    /// Sets a structured payload.
    pub fn with_structured_payload(mut self, value: Value) -> Self {
        self.payload = ActionPayload::structured(value);
        self
    }

    /// Sets a raw payload, bypassing interface decoding.
    pub fn with_raw_payload(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.payload = ActionPayload::raw(bytes);
        self
    }

    /// Declares an authorization.
    pub fn with_authorization(mut self, actor: Name, permission: Name) -> Self {
        self.authorization
            .push(PermissionLevel::new(actor, permission));
        self
    }

    /// Declares an `active` authorization of `actor`.
    pub fn with_active_authorization(self, actor: Name) -> Self {
        self.with_authorization(actor, ACTIVE_PERMISSION.clone())
    }

    /// Finishes building the [`Action`].
    pub fn build(self) -> Action {
        Action {
            account: self.account,
            name: self.name,
            payload: self.payload,
            authorization: self.authorization,
        }
    }
}

/// Builds a [`Transaction`].
#[derive(Clone, Debug, Default)]
pub struct TransactionBuilder {
    actions: Vec<Action>,
    signing_keys: Vec<PublicKey>,
}

impl TransactionBuilder {
    /// Starts an empty transaction.
    pub fn new() -> Self {
        TransactionBuilder::default()
    }

    /// Appends an action.
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Adds a signing key.
    pub fn with_signing_key(mut self, key: PublicKey) -> Self {
        self.signing_keys.push(key);
        self
    }

    /// Finishes building the [`Transaction`].
    pub fn build(self) -> Transaction {
        Transaction::new(self.actions).with_signing_keys(self.signing_keys)
    }
}
