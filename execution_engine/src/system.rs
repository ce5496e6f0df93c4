//! Native administrative actions of the system account.
//!
//! Account and permission management and contract deployment flow
//! through the dispatcher like any other action, targeted at the
//! system account. Their payloads are structured records; the
//! dispatcher resolves them here instead of consulting a contract
//! interface.

use std::time::Instant;

use once_cell::sync::Lazy;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use vellum_types::{
    interface::InterfaceError, Action, ActionPayload, Authority, InterfaceDescription, Name,
    PermissionLevel,
};

use crate::{
    authority::{AuthorizationError, StructureError, ACTIVE_PERMISSION},
    contracts::DeployedContract,
    engine_state::{ActionReceipt, Error},
    execution::{EngineFault, ExecutionEngine},
    state::GlobalState,
};

/// The system account, established at genesis.
pub static SYSTEM_ACCOUNT: Lazy<Name> =
    Lazy::new(|| Name::new("vellum").expect("valid account name"));

/// Creates an account.
pub static NEWACCOUNT_ACTION: Lazy<Name> =
    Lazy::new(|| Name::new("newaccount").expect("valid action name"));
/// Creates or replaces a permission.
pub static UPDATEAUTH_ACTION: Lazy<Name> =
    Lazy::new(|| Name::new("updateauth").expect("valid action name"));
/// Removes a permission.
pub static DELETEAUTH_ACTION: Lazy<Name> =
    Lazy::new(|| Name::new("deleteauth").expect("valid action name"));
/// Deploys or replaces a contract.
pub static SETCODE_ACTION: Lazy<Name> =
    Lazy::new(|| Name::new("setcode").expect("valid action name"));
/// Undeploys a contract.
pub static CLEARCODE_ACTION: Lazy<Name> =
    Lazy::new(|| Name::new("clearcode").expect("valid action name"));

/// Payload of [`NEWACCOUNT_ACTION`].
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct NewAccount {
    /// The existing account paying for and authorizing the creation.
    pub creator: Name,
    /// The account to create.
    pub name: Name,
    /// Root permission authority.
    pub owner: Authority,
    /// Default operational authority.
    pub active: Authority,
}

/// Payload of [`UPDATEAUTH_ACTION`].
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct UpdateAuth {
    /// The account whose permission is changed.
    pub account: Name,
    /// The permission to create or replace.
    pub permission: Name,
    /// Parent permission; omitted only for the root permission.
    #[serde(default)]
    pub parent: Option<Name>,
    /// The new authority.
    pub auth: Authority,
}

/// Payload of [`DELETEAUTH_ACTION`].
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct DeleteAuth {
    /// The account whose permission is removed.
    pub account: Name,
    /// The permission to remove.
    pub permission: Name,
}

/// Payload of [`SETCODE_ACTION`].
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct SetCode {
    /// The account receiving the deployment.
    pub account: Name,
    /// The executable code blob.
    #[serde(with = "hex::serde")]
    pub code: Vec<u8>,
    /// The interface description bytes (JSON).
    #[serde(with = "hex::serde")]
    pub interface: Vec<u8>,
}

/// Payload of [`CLEARCODE_ACTION`].
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct ClearCode {
    /// The account to undeploy.
    pub account: Name,
}

/// Returns whether `name` is handled natively by the system account.
pub fn is_system_action(name: &Name) -> bool {
    name == &*NEWACCOUNT_ACTION
        || name == &*UPDATEAUTH_ACTION
        || name == &*DELETEAUTH_ACTION
        || name == &*SETCODE_ACTION
        || name == &*CLEARCODE_ACTION
}

fn parse_payload<T: DeserializeOwned>(action: &Action) -> Result<T, Error> {
    let value = match &action.payload {
        ActionPayload::Structured(value) => value,
        ActionPayload::Raw(_) => return Err(Error::PayloadDecode(InterfaceError::ExpectedObject)),
    };
    serde_json::from_value(value.clone())
        .map_err(|error| Error::PayloadDecode(InterfaceError::Payload(error.to_string())))
}

/// The action must declare an authorization of `account`; the declared
/// authorizations themselves were validated against the signing keys
/// before the system action is applied.
fn require_declared_auth(action: &Action, account: &Name) -> Result<(), Error> {
    if action
        .authorization
        .iter()
        .any(|level| &level.actor == account)
    {
        Ok(())
    } else {
        Err(Error::Authorization(AuthorizationError {
            level: PermissionLevel::new(account.clone(), ACTIVE_PERMISSION.clone()),
        }))
    }
}

pub(crate) fn apply<E: ExecutionEngine>(
    state: &mut GlobalState,
    engine: &mut E,
    action: &Action,
) -> Result<ActionReceipt, Error> {
    let start = Instant::now();

    if action.name == *NEWACCOUNT_ACTION {
        let payload: NewAccount = parse_payload(action)?;
        require_declared_auth(action, &payload.creator)?;
        if !state.auth.account_exists(&payload.creator) {
            return Err(StructureError::UnknownAccount(payload.creator).into());
        }
        state
            .auth
            .create_account(payload.name.clone(), payload.owner, payload.active)?;
        debug!(account = %payload.name, creator = %payload.creator, "account created");
    } else if action.name == *UPDATEAUTH_ACTION {
        let payload: UpdateAuth = parse_payload(action)?;
        require_declared_auth(action, &payload.account)?;
        state.auth.set_permission(
            &payload.account,
            &payload.permission,
            payload.parent,
            payload.auth,
        )?;
        debug!(account = %payload.account, permission = %payload.permission, "authority updated");
    } else if action.name == *DELETEAUTH_ACTION {
        let payload: DeleteAuth = parse_payload(action)?;
        require_declared_auth(action, &payload.account)?;
        state
            .auth
            .remove_permission(&payload.account, &payload.permission)?;
        debug!(account = %payload.account, permission = %payload.permission, "authority removed");
    } else if action.name == *SETCODE_ACTION {
        let payload: SetCode = parse_payload(action)?;
        require_declared_auth(action, &payload.account)?;
        if !state.auth.account_exists(&payload.account) {
            return Err(StructureError::UnknownAccount(payload.account).into());
        }
        // Deployment is atomic: both blobs are validated before the
        // registry entry is touched.
        match engine.validate_code(&payload.code) {
            Ok(()) => {}
            Err(EngineFault::Revert(message)) => return Err(Error::InvalidCode(message)),
            Err(EngineFault::Fatal(message)) => return Err(Error::FatalEngineFault(message)),
        }
        let interface = InterfaceDescription::from_json_bytes(&payload.interface)
            .map_err(|error| Error::InvalidCode(format!("interface description: {}", error)))?;
        state.contracts.install(
            payload.account.clone(),
            DeployedContract::new(payload.code, interface),
        );
        debug!(account = %payload.account, "contract deployed");
    } else if action.name == *CLEARCODE_ACTION {
        let payload: ClearCode = parse_payload(action)?;
        require_declared_auth(action, &payload.account)?;
        if state.contracts.remove(&payload.account).is_none() {
            return Err(Error::NoSuchContract(payload.account));
        }
        debug!(account = %payload.account, "contract undeployed");
    } else {
        // The dispatcher only routes the names above here.
        return Err(Error::NoSuchContract(action.account.clone()));
    }

    Ok(ActionReceipt {
        receiver: action.account.clone(),
        action: action.name.clone(),
        console: String::new(),
        elapsed: start.elapsed(),
    })
}
