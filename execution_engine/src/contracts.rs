//! The contract registry.

use std::{collections::BTreeMap, sync::Arc};

use vellum_types::{InterfaceDescription, Name};

/// A contract deployed to an account: its executable code blob and its
/// action/table interface description. Both are opaque to the harness;
/// the code was validated by the execution engine at deploy time.
#[derive(Clone, Debug)]
pub struct DeployedContract {
    code: Arc<Vec<u8>>,
    interface: Arc<InterfaceDescription>,
}

impl DeployedContract {
    /// Constructs a deployed contract.
    pub fn new(code: Vec<u8>, interface: InterfaceDescription) -> Self {
        DeployedContract {
            code: Arc::new(code),
            interface: Arc::new(interface),
        }
    }

    /// The executable code blob.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// The interface description.
    pub fn interface(&self) -> &InterfaceDescription {
        &self.interface
    }
}

/// Maps accounts to their currently deployed contract.
#[derive(Clone, Debug, Default)]
pub struct ContractRegistry {
    deployed: BTreeMap<Name, DeployedContract>,
}

impl ContractRegistry {
    /// Installs `contract` on `account`, replacing any previous
    /// deployment wholesale. There is no partial upgrade.
    pub fn install(&mut self, account: Name, contract: DeployedContract) {
        self.deployed.insert(account, contract);
    }

    /// Looks up the contract deployed on `account`, if any.
    pub fn lookup(&self, account: &Name) -> Option<&DeployedContract> {
        self.deployed.get(account)
    }

    /// Removes the deployment from `account`; afterwards the account
    /// can no longer receive actions.
    pub fn remove(&mut self, account: &Name) -> Option<DeployedContract> {
        self.deployed.remove(account)
    }

    /// Returns whether `account` has a deployed contract.
    pub fn is_deployed(&self, account: &Name) -> bool {
        self.deployed.contains_key(account)
    }
}
