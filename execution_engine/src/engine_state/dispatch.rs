//! The action dispatcher.
//!
//! Applies one action against the speculative chain state:
//! authorization first, then target resolution, payload decoding and
//! engine execution. Authorization is always checked before the target
//! is even looked up, so an unauthorized action on a nonexistent
//! contract reports the authorization failure.

use std::collections::BTreeSet;

use tracing::debug;

use vellum_types::{Action, ActionPayload, PublicKey};

use crate::{
    engine_state::{ActionReceipt, ChainConfig, Error},
    execution::{EngineFault, ExecutionContext, ExecutionEngine},
    state::GlobalState,
    system,
};

pub(crate) fn dispatch_action<E: ExecutionEngine>(
    config: &ChainConfig,
    state: &mut GlobalState,
    engine: &mut E,
    action: &Action,
    signing_keys: &BTreeSet<PublicKey>,
) -> Result<ActionReceipt, Error> {
    state
        .auth
        .authorize(&action.authorization, signing_keys, config.max_auth_depth())?;

    if action.account == *system::SYSTEM_ACCOUNT && system::is_system_action(&action.name) {
        return system::apply(state, engine, action);
    }

    // Cheap clone; code and interface are behind `Arc`.
    let contract = state
        .contracts
        .lookup(&action.account)
        .cloned()
        .ok_or_else(|| Error::NoSuchContract(action.account.clone()))?;

    let (data, args): (Vec<u8>, Option<&serde_json::Value>) = match &action.payload {
        ActionPayload::Raw(bytes) => (bytes.clone(), None),
        ActionPayload::Structured(value) => (
            contract.interface().decode_action(&action.name, value)?,
            Some(value),
        ),
    };

    let mut context = ExecutionContext::new(
        config,
        action.account.clone(),
        action.name.clone(),
        &data,
        args,
        &action.authorization,
        &mut state.tables,
    );
    let result = engine.execute(&mut context);
    let console = context.take_console();

    match result {
        Ok(outcome) => {
            debug!(
                receiver = %action.account,
                action = %action.name,
                elapsed_us = outcome.elapsed.as_micros() as u64,
                "action executed"
            );
            Ok(ActionReceipt {
                receiver: action.account.clone(),
                action: action.name.clone(),
                console,
                elapsed: outcome.elapsed,
            })
        }
        Err(EngineFault::Revert(message)) => Err(Error::Execution(message)),
        Err(EngineFault::Fatal(message)) => Err(Error::FatalEngineFault(message)),
    }
}
