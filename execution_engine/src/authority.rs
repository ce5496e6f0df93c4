//! The account and permission registry.
//!
//! Each account owns a tree of named permissions rooted at `owner`.
//! A permission is satisfied by a set of signing keys when the weights
//! of keys directly present on it, plus the weights of delegated
//! permissions that are themselves satisfied (resolved recursively,
//! cycle-guarded and depth-limited), reach its threshold.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing::debug;

use vellum_types::{Authority, AuthorityError, Name, PermissionLevel, PublicKey};

/// Name of the root permission every account owns.
pub static OWNER_PERMISSION: Lazy<Name> =
    Lazy::new(|| Name::new("owner").expect("valid permission name"));
/// Name of the default operational permission.
pub static ACTIVE_PERMISSION: Lazy<Name> =
    Lazy::new(|| Name::new("active").expect("valid permission name"));

/// Structural defects in accounts and permissions.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
pub enum StructureError {
    /// The referenced account does not exist.
    #[error("unknown account: {0}")]
    UnknownAccount(Name),
    /// An account with that name already exists.
    #[error("account already exists: {0}")]
    AccountExists(Name),
    /// The referenced permission does not exist.
    #[error("unknown permission: {0}")]
    UnknownPermission(PermissionLevel),
    /// The parent named for a new permission does not exist.
    #[error("unknown parent permission: {0}")]
    UnknownParent(PermissionLevel),
    /// An update may not move a permission to a different parent.
    #[error("cannot change the parent of permission {0}")]
    ParentMismatch(PermissionLevel),
    /// Only leaf permissions can be removed.
    #[error("cannot remove permission {0}: it has child permissions")]
    HasChildren(PermissionLevel),
    /// The root permission cannot be removed.
    #[error("cannot remove the root permission {0}")]
    RemoveRoot(PermissionLevel),
    /// The delegation graph would contain a cycle.
    #[error("delegation cycle through {0}")]
    DelegationCycle(PermissionLevel),
    /// The authority itself is malformed.
    #[error(transparent)]
    Authority(#[from] AuthorityError),
    /// A transaction carried no actions.
    #[error("transaction contains no actions")]
    EmptyTransaction,
}

/// A required permission was not satisfied by the supplied signing
/// keys.
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("authorization failure: {level} not satisfied")]
pub struct AuthorizationError {
    /// The permission that could not be satisfied.
    pub level: PermissionLevel,
}

/// A named permission of an account.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Permission {
    /// Parent permission name; `None` only for the root.
    pub parent: Option<Name>,
    /// The weighted-threshold rule gating this permission.
    pub authority: Authority,
}

/// Registry of accounts and their permission trees.
#[derive(Clone, Debug, Default)]
pub struct AuthorityRegistry {
    accounts: BTreeMap<Name, BTreeMap<Name, Permission>>,
}

impl AuthorityRegistry {
    /// Returns whether `name` is a registered account.
    pub fn account_exists(&self, name: &Name) -> bool {
        self.accounts.contains_key(name)
    }

    /// Creates an account with the standard `owner`/`active` permission
    /// pair.
    pub fn create_account(
        &mut self,
        name: Name,
        owner: Authority,
        active: Authority,
    ) -> Result<(), StructureError> {
        if self.accounts.contains_key(&name) {
            return Err(StructureError::AccountExists(name));
        }
        owner.validate()?;
        active.validate()?;
        let mut permissions = BTreeMap::new();
        permissions.insert(
            OWNER_PERMISSION.clone(),
            Permission {
                parent: None,
                authority: owner,
            },
        );
        permissions.insert(
            ACTIVE_PERMISSION.clone(),
            Permission {
                parent: Some(OWNER_PERMISSION.clone()),
                authority: active,
            },
        );
        self.accounts.insert(name, permissions);
        Ok(())
    }

    /// Looks up a permission.
    pub fn get_permission(&self, level: &PermissionLevel) -> Result<&Permission, StructureError> {
        let permissions = self
            .accounts
            .get(&level.actor)
            .ok_or_else(|| StructureError::UnknownAccount(level.actor.clone()))?;
        permissions
            .get(&level.permission)
            .ok_or_else(|| StructureError::UnknownPermission(level.clone()))
    }

    /// Creates or replaces a permission of an account.
    ///
    /// Rejects malformed authorities, unknown or changed parents, and
    /// updates that would introduce a delegation cycle. The mutation is
    /// atomic: on any error the registry is untouched.
    pub fn set_permission(
        &mut self,
        account: &Name,
        name: &Name,
        parent: Option<Name>,
        authority: Authority,
    ) -> Result<(), StructureError> {
        if !self.accounts.contains_key(account) {
            return Err(StructureError::UnknownAccount(account.clone()));
        }
        authority.validate()?;

        let level = PermissionLevel::new(account.clone(), name.clone());
        let permissions = &self.accounts[account];
        match permissions.get(name) {
            Some(existing) => {
                if existing.parent != parent {
                    return Err(StructureError::ParentMismatch(level));
                }
            }
            None => match &parent {
                Some(parent_name) => {
                    if !permissions.contains_key(parent_name) {
                        return Err(StructureError::UnknownParent(PermissionLevel::new(
                            account.clone(),
                            parent_name.clone(),
                        )));
                    }
                }
                // Only the root permission may have no parent, and the
                // root always exists once the account does.
                None => return Err(StructureError::ParentMismatch(level)),
            },
        }

        if self.would_cycle(&level, &authority) {
            return Err(StructureError::DelegationCycle(level));
        }

        let permissions = self
            .accounts
            .get_mut(account)
            .expect("account presence checked above");
        permissions.insert(name.clone(), Permission { parent, authority });
        Ok(())
    }

    /// Removes a leaf, non-root permission.
    pub fn remove_permission(&mut self, account: &Name, name: &Name) -> Result<(), StructureError> {
        let level = PermissionLevel::new(account.clone(), name.clone());
        let permissions = self
            .accounts
            .get(account)
            .ok_or_else(|| StructureError::UnknownAccount(account.clone()))?;
        let permission = permissions
            .get(name)
            .ok_or_else(|| StructureError::UnknownPermission(level.clone()))?;
        if permission.parent.is_none() {
            return Err(StructureError::RemoveRoot(level));
        }
        if permissions
            .values()
            .any(|candidate| candidate.parent.as_ref() == Some(name))
        {
            return Err(StructureError::HasChildren(level));
        }
        let permissions = self
            .accounts
            .get_mut(account)
            .expect("account presence checked above");
        permissions.remove(name);
        Ok(())
    }

    /// Checks that every required permission is satisfied by
    /// `signing_keys`.
    ///
    /// Read-only; recursion through delegated permissions is guarded
    /// against cycles and bounded by `max_depth`.
    pub fn authorize(
        &self,
        required: &[PermissionLevel],
        signing_keys: &BTreeSet<PublicKey>,
        max_depth: u32,
    ) -> Result<(), AuthorizationError> {
        for level in required {
            let mut in_progress = BTreeSet::new();
            if !self.satisfies(level, signing_keys, max_depth, &mut in_progress) {
                debug!(%level, "authorization failed");
                return Err(AuthorizationError {
                    level: level.clone(),
                });
            }
        }
        Ok(())
    }

    fn satisfies(
        &self,
        level: &PermissionLevel,
        signing_keys: &BTreeSet<PublicKey>,
        depth: u32,
        in_progress: &mut BTreeSet<PermissionLevel>,
    ) -> bool {
        if depth == 0 {
            return false;
        }
        if !in_progress.insert(level.clone()) {
            // Already on the current resolution path: a cycle in stored
            // data must not recurse forever.
            return false;
        }
        let satisfied = match self.get_permission(level) {
            Ok(permission) => {
                let threshold = u64::from(permission.authority.threshold);
                let mut weight: u64 = permission
                    .authority
                    .keys
                    .iter()
                    .filter(|entry| signing_keys.contains(&entry.key))
                    .map(|entry| u64::from(entry.weight.value()))
                    .sum();
                if weight < threshold {
                    for delegated in &permission.authority.accounts {
                        if self.satisfies(
                            &delegated.permission,
                            signing_keys,
                            depth - 1,
                            in_progress,
                        ) {
                            weight += u64::from(delegated.weight.value());
                            if weight >= threshold {
                                break;
                            }
                        }
                    }
                }
                weight >= threshold
            }
            // Delegations to permissions that do not (or no longer)
            // exist simply contribute nothing.
            Err(_) => false,
        };
        in_progress.remove(level);
        satisfied
    }

    /// Would installing `authority` at `level` close a delegation
    /// cycle back to `level`?
    fn would_cycle(&self, level: &PermissionLevel, authority: &Authority) -> bool {
        let mut queue: Vec<PermissionLevel> = authority
            .accounts
            .iter()
            .map(|delegated| delegated.permission.clone())
            .collect();
        let mut visited = BTreeSet::new();
        while let Some(current) = queue.pop() {
            if &current == level {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Ok(permission) = self.get_permission(&current) {
                queue.extend(
                    permission
                        .authority
                        .accounts
                        .iter()
                        .map(|delegated| delegated.permission.clone()),
                );
            }
        }
        false
    }
}
