//! Shared data types for the vellum contract test harness.
//!
//! Everything in this crate is plain data: chain identifiers, key
//! material, authority structures, actions and transactions, and
//! contract interface descriptions. Behavior (registries, dispatch,
//! block production) lives in `vellum-execution-engine`.

#![warn(missing_docs)]

mod action;
pub mod authority;
pub mod crypto;
pub mod interface;
mod name;
mod transaction;

pub use action::{Action, ActionPayload};
pub use authority::{
    Authority, AuthorityError, KeyWeight, PermissionLevel, PermissionLevelWeight, Weight,
};
pub use crypto::{PublicKey, SecretKey, Signature};
pub use interface::InterfaceDescription;
pub use name::{FromStrError, Name, MAX_NAME_LENGTH};
pub use transaction::Transaction;
