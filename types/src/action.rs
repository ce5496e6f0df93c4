//! Actions directed at a contract.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{authority::PermissionLevel, name::Name};

/// The payload carried by an [`Action`].
///
/// Raw payloads bypass interface decoding and reach the execution
/// engine verbatim; structured payloads are resolved against the target
/// contract's interface description before execution.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub enum ActionPayload {
    /// Opaque bytes passed through untouched.
    Raw(#[serde(with = "hex::serde")] Vec<u8>),
    /// A structured record, validated and canonically encoded against
    /// the target's interface description.
    Structured(Value),
}

impl ActionPayload {
    /// An empty structured payload.
    pub fn empty() -> Self {
        ActionPayload::Structured(Value::Object(Default::default()))
    }

    /// A raw byte payload.
    pub fn raw(bytes: impl Into<Vec<u8>>) -> Self {
        ActionPayload::Raw(bytes.into())
    }

    /// A structured payload.
    pub fn structured(value: Value) -> Self {
        ActionPayload::Structured(value)
    }
}

/// A single named operation directed at a target account's contract,
/// with its declared required authorizations.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Action {
    /// The account whose contract receives the action.
    pub account: Name,
    /// The action name, resolved against the target's interface.
    pub name: Name,
    /// The payload.
    pub payload: ActionPayload,
    /// Permissions that must be satisfied for the action to run.
    pub authorization: Vec<PermissionLevel>,
}

impl Action {
    /// Constructs a new action.
    pub fn new(
        account: Name,
        name: Name,
        payload: ActionPayload,
        authorization: Vec<PermissionLevel>,
    ) -> Self {
        Action {
            account,
            name,
            payload,
            authorization,
        }
    }
}
