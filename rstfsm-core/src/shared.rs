//! Lock-guarded machine handle for multi-threaded hosts.

use crate::definition::{MachineConfig, State};
use crate::error::CoreError;
use crate::machine::{ApplyResult, Machine};
use parking_lot::RwLock;
use std::sync::Arc;

/// A cloneable, thread-safe handle to a single [`Machine`].
///
/// Every call takes the lock once, so each operation is atomic with respect
/// to other handles. Use [`SharedMachine::with_mut`] when several steps must
/// happen without interleaving.
#[derive(Debug, Clone)]
pub struct SharedMachine {
    inner: Arc<RwLock<Machine>>,
}

impl SharedMachine {
    pub fn new(machine: Machine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(machine)),
        }
    }

    /// Creates a handle to a fresh machine for `config`.
    pub fn from_config(config: Arc<MachineConfig>) -> Self {
        Self::new(Machine::new(config))
    }

    /// Returns a copy of the current state.
    pub fn state(&self) -> State {
        self.inner.read().state().clone()
    }

    pub fn states(&self, event: Option<&str>) -> Vec<State> {
        self.inner
            .read()
            .states(event)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn change_state(&self, target: &str) -> Result<ApplyResult, CoreError> {
        self.inner.write().change_state(target)
    }

    pub fn trigger(&self, event: &str) -> Result<ApplyResult, CoreError> {
        self.inner.write().trigger(event)
    }

    pub fn undo(&self) -> bool {
        self.inner.write().undo()
    }

    pub fn redo(&self) -> bool {
        self.inner.write().redo()
    }

    pub fn reset(&self) {
        self.inner.write().reset()
    }

    pub fn clear_history(&self) {
        self.inner.write().clear_history()
    }

    /// Runs `f` with shared access to the machine.
    pub fn with<R>(&self, f: impl FnOnce(&Machine) -> R) -> R {
        f(&*self.inner.read())
    }

    /// Runs `f` with exclusive access to the machine.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Machine) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Returns a detached copy of the machine.
    pub fn snapshot(&self) -> Machine {
        self.inner.read().clone()
    }
}

impl From<Machine> for SharedMachine {
    fn from(machine: Machine) -> Self {
        Self::new(machine)
    }
}
