//! An in-process execution engine whose contract behavior is supplied
//! by the test as Rust closures.

use std::{cell::RefCell, collections::BTreeMap, fmt, rc::Rc, time::Instant};

use vellum_execution_engine::execution::{
    EngineFault, ExecutionContext, ExecutionEngine, ExecutionOutcome,
};
use vellum_types::Name;

/// Leading bytes every valid sandbox code blob must carry.
pub const CODE_MAGIC: &[u8] = b"\0sbx";

type Handler = dyn Fn(&mut ExecutionContext<'_>) -> Result<(), EngineFault>;

#[derive(Default)]
struct Inner {
    handlers: BTreeMap<(Name, Name), Rc<Handler>>,
}

/// A sandbox engine.
///
/// Cloning shares the handler table, so a test can keep one clone to
/// register handlers after moving another into the chain. Handlers are
/// keyed by receiver account and action name; an action without a
/// handler reverts.
#[derive(Clone, Default)]
pub struct SandboxEngine {
    inner: Rc<RefCell<Inner>>,
}

impl SandboxEngine {
    /// Creates an engine with an empty handler table.
    pub fn new() -> Self {
        SandboxEngine::default()
    }

    /// Returns a minimal code blob the engine accepts at deploy time.
    pub fn valid_code() -> Vec<u8> {
        CODE_MAGIC.to_vec()
    }

    /// Registers the behavior of `action` on the contract deployed to
    /// `receiver`, replacing any previous handler.
    pub fn register<F>(&self, receiver: Name, action: Name, handler: F)
    where
        F: Fn(&mut ExecutionContext<'_>) -> Result<(), EngineFault> + 'static,
    {
        self.inner
            .borrow_mut()
            .handlers
            .insert((receiver, action), Rc::new(handler));
    }

    /// Removes the handler of `action` on `receiver`, if any.
    pub fn unregister(&self, receiver: &Name, action: &Name) {
        self.inner
            .borrow_mut()
            .handlers
            .remove(&(receiver.clone(), action.clone()));
    }
}

impl fmt::Debug for SandboxEngine {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SandboxEngine")
            .field("handlers", &self.inner.borrow().handlers.len())
            .finish()
    }
}

impl ExecutionEngine for SandboxEngine {
    fn validate_code(&self, code: &[u8]) -> Result<(), EngineFault> {
        if code.is_empty() {
            return Err(EngineFault::revert("empty code blob"));
        }
        if !code.starts_with(CODE_MAGIC) {
            return Err(EngineFault::revert("code blob lacks the sandbox magic"));
        }
        Ok(())
    }

    fn execute(
        &mut self,
        context: &mut ExecutionContext<'_>,
    ) -> Result<ExecutionOutcome, EngineFault> {
        let key = (context.receiver().clone(), context.action().clone());
        // Clone out of the table so the borrow is released before the
        // handler runs; a handler may touch a shared engine clone.
        let handler = self.inner.borrow().handlers.get(&key).cloned();
        let handler = handler.ok_or_else(|| {
            EngineFault::revert(format!("unknown action {}::{}", key.0, key.1))
        })?;
        let start = Instant::now();
        handler(context)?;
        Ok(ExecutionOutcome {
            elapsed: start.elapsed(),
        })
    }
}
