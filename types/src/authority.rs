//! Weighted-threshold authority structures.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{crypto::PublicKey, name::Name};

/// The weight a key or delegated account contributes towards a
/// threshold.
#[derive(
    Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Weight(u16);

impl Weight {
    /// Constructs a new weight.
    pub const fn new(value: u16) -> Self {
        Weight(value)
    }

    /// Returns the raw weight value.
    pub fn value(self) -> u16 {
        self.0
    }
}

impl Display for Weight {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        Display::fmt(&self.0, formatter)
    }
}

/// A public key and the weight it contributes.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct KeyWeight {
    /// The signing key.
    pub key: PublicKey,
    /// The weight carried by a signature from `key`.
    pub weight: Weight,
}

/// A reference to a named permission of an account.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
pub struct PermissionLevel {
    /// The account owning the permission.
    pub actor: Name,
    /// The permission name.
    pub permission: Name,
}

impl PermissionLevel {
    /// Constructs a new permission level.
    pub fn new(actor: Name, permission: Name) -> Self {
        PermissionLevel { actor, permission }
    }
}

impl Display for PermissionLevel {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}@{}", self.actor, self.permission)
    }
}

/// A delegated permission and the weight it contributes.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Serialize, Deserialize)]
pub struct PermissionLevelWeight {
    /// The delegated permission.
    pub permission: PermissionLevel,
    /// The weight carried when the delegated permission is satisfied.
    pub weight: Weight,
}

/// Structural defects in an [`Authority`].
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum AuthorityError {
    /// Threshold of zero can never gate anything.
    #[error("authority threshold must be positive")]
    ZeroThreshold,
    /// A zero weight entry can never contribute.
    #[error("zero weight entry for {0}")]
    ZeroWeight(String),
    /// Keys must be sorted and unique.
    #[error("authority keys must be sorted and unique")]
    UnsortedKeys,
    /// Delegated accounts must be sorted and unique.
    #[error("delegated accounts must be sorted and unique")]
    UnsortedAccounts,
    /// The combined weights cannot reach the threshold.
    #[error("unsatisfiable threshold {threshold}: total weight is {total_weight}")]
    Unsatisfiable {
        /// The configured threshold.
        threshold: u32,
        /// The sum of all key and delegation weights.
        total_weight: u64,
    },
}

/// A weighted-threshold authorization rule: a set of keys and delegated
/// permissions whose combined weights must meet `threshold`.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Authority {
    /// The weight sum that must be reached.
    pub threshold: u32,
    /// Keys which contribute weight directly.
    pub keys: Vec<KeyWeight>,
    /// Permissions of other accounts which contribute weight when
    /// themselves satisfied.
    #[serde(default)]
    pub accounts: Vec<PermissionLevelWeight>,
}

impl Authority {
    /// Constructs a new authority.
    pub fn new(threshold: u32, keys: Vec<KeyWeight>, accounts: Vec<PermissionLevelWeight>) -> Self {
        Authority {
            threshold,
            keys,
            accounts,
        }
    }

    /// A single-key authority with threshold 1.
    pub fn key(key: PublicKey) -> Self {
        Authority {
            threshold: 1,
            keys: vec![KeyWeight {
                key,
                weight: Weight::new(1),
            }],
            accounts: Vec::new(),
        }
    }

    /// Sum of all key and delegation weights.
    pub fn total_weight(&self) -> u64 {
        let key_weight: u64 = self
            .keys
            .iter()
            .map(|entry| u64::from(entry.weight.value()))
            .sum();
        let account_weight: u64 = self
            .accounts
            .iter()
            .map(|entry| u64::from(entry.weight.value()))
            .sum();
        key_weight + account_weight
    }

    /// Whether the threshold can be reached at all.
    pub fn is_satisfiable(&self) -> bool {
        self.threshold > 0 && self.total_weight() >= u64::from(self.threshold)
    }

    /// Validates the structural invariants: positive threshold, no zero
    /// weights, sorted unique entries, reachable threshold.
    pub fn validate(&self) -> Result<(), AuthorityError> {
        if self.threshold == 0 {
            return Err(AuthorityError::ZeroThreshold);
        }
        for entry in &self.keys {
            if entry.weight.value() == 0 {
                return Err(AuthorityError::ZeroWeight(entry.key.to_string()));
            }
        }
        for entry in &self.accounts {
            if entry.weight.value() == 0 {
                return Err(AuthorityError::ZeroWeight(entry.permission.to_string()));
            }
        }
        if !is_sorted_unique(self.keys.iter().map(|entry| &entry.key)) {
            return Err(AuthorityError::UnsortedKeys);
        }
        if !is_sorted_unique(self.accounts.iter().map(|entry| &entry.permission)) {
            return Err(AuthorityError::UnsortedAccounts);
        }
        let total_weight = self.total_weight();
        if total_weight < u64::from(self.threshold) {
            return Err(AuthorityError::Unsatisfiable {
                threshold: self.threshold,
                total_weight,
            });
        }
        Ok(())
    }
}

fn is_sorted_unique<'a, T: Ord + 'a>(items: impl Iterator<Item = &'a T>) -> bool {
    let mut previous: Option<&T> = None;
    for item in items {
        if let Some(previous) = previous {
            if previous >= item {
                return false;
            }
        }
        previous = Some(item);
    }
    true
}
