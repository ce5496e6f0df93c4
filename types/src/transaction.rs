//! Atomic batches of actions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{action::Action, crypto::PublicKey};

/// An ordered sequence of actions applied atomically, together with the
/// set of keys that signed it.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// The actions, applied in order.
    pub actions: Vec<Action>,
    /// Keys whose signatures are attached to the transaction.
    pub signing_keys: BTreeSet<PublicKey>,
}

impl Transaction {
    /// Constructs a transaction with no signing keys attached.
    pub fn new(actions: Vec<Action>) -> Self {
        Transaction {
            actions,
            signing_keys: BTreeSet::new(),
        }
    }

    /// Attaches a signing key.
    pub fn with_signing_key(mut self, key: PublicKey) -> Self {
        self.signing_keys.insert(key);
        self
    }

    /// Attaches several signing keys.
    pub fn with_signing_keys(mut self, keys: impl IntoIterator<Item = PublicKey>) -> Self {
        self.signing_keys.extend(keys);
        self
    }
}
