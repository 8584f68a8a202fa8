//! State machine engine - current state plus linear undo/redo history.

use crate::definition::{MachineConfig, State};
use crate::error::CoreError;
use serde_json::Value;
use std::sync::Arc;

/// Result of a successful `change_state` or `trigger`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub from_state: State,
    pub to_state: State,
    /// Event that fired, `None` for a direct jump.
    pub event: Option<String>,
}

/// A running state machine.
///
/// Not internally synchronized; see [`crate::SharedMachine`] for a
/// lock-guarded handle.
#[derive(Debug, Clone)]
pub struct Machine {
    /// Shared, read-only configuration.
    config: Arc<MachineConfig>,

    /// Current state. Always declared in `config`.
    state: State,

    /// Previously visited states, most recent last.
    history: Vec<State>,

    /// States available to redo, next target last.
    future: Vec<State>,

    /// Set by `undo`, cleared by any fresh transition. While false, `future`
    /// is stale and `redo` refuses to replay it.
    redo_enabled: bool,
}

impl Machine {
    /// Creates a machine in the configuration's initial state.
    pub fn new(config: Arc<MachineConfig>) -> Self {
        let state = config.initial().clone();
        Self {
            config,
            state,
            history: Vec::new(),
            future: Vec::new(),
            redo_enabled: false,
        }
    }

    /// Creates a machine from an optional configuration.
    pub fn try_new(config: Option<Arc<MachineConfig>>) -> Result<Self, CoreError> {
        config
            .map(Self::new)
            .ok_or_else(|| CoreError::invalid("configuration is required"))
    }

    /// Parses a configuration and creates a machine from it.
    pub fn from_json(json: &Value) -> Result<Self, CoreError> {
        Ok(Self::new(Arc::new(MachineConfig::from_json(json)?)))
    }

    pub fn config(&self) -> &Arc<MachineConfig> {
        &self.config
    }

    /// Returns the current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns all states, or only those declaring `event`, in configured order.
    pub fn states(&self, event: Option<&str>) -> Vec<&State> {
        match event {
            None => self.config.state_names(),
            Some(event) => self.config.states_with_event(event),
        }
    }

    /// Returns the events available from the current state.
    pub fn events(&self) -> Vec<&str> {
        self.config.events_from(&self.state)
    }

    /// Jumps to `target`, bypassing transition rules.
    pub fn change_state(&mut self, target: &str) -> Result<ApplyResult, CoreError> {
        if !self.config.has_state(target) {
            return Err(CoreError::UnknownState {
                state: target.to_string(),
            });
        }

        Ok(self.advance(State::from(target), None))
    }

    /// Fires `event` from the current state.
    pub fn trigger(&mut self, event: &str) -> Result<ApplyResult, CoreError> {
        let to_state = self
            .config
            .get_transition(&self.state, event)
            .cloned()
            .ok_or_else(|| CoreError::UnknownTransition {
                state: self.state.as_str().to_string(),
                event: event.to_string(),
            })?;

        Ok(self.advance(to_state, Some(event.to_string())))
    }

    fn advance(&mut self, to_state: State, event: Option<String>) -> ApplyResult {
        let from_state = std::mem::replace(&mut self.state, to_state.clone());
        self.history.push(from_state.clone());
        self.redo_enabled = false;

        tracing::debug!(
            "transition {} -> {} (event: {})",
            from_state,
            to_state,
            event.as_deref().unwrap_or("-")
        );

        ApplyResult {
            from_state,
            to_state,
            event,
        }
    }

    /// Steps back to the previous state. Returns false if there is no history.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.state, previous);
        tracing::debug!("undo {} -> {}", current, self.state);
        self.future.push(current);
        self.redo_enabled = true;
        true
    }

    /// Re-applies the most recently undone state.
    ///
    /// Returns false if nothing was undone, or if a transition happened since
    /// the last undo.
    pub fn redo(&mut self) -> bool {
        if !self.redo_enabled {
            return false;
        }
        let Some(next) = self.future.pop() else {
            return false;
        };

        let current = std::mem::replace(&mut self.state, next);
        tracing::debug!("redo {} -> {}", current, self.state);
        self.history.push(current);
        true
    }

    /// Returns to the initial state and forgets all history.
    pub fn reset(&mut self) {
        self.state = self.config.initial().clone();
        self.history.clear();
        self.future.clear();
        self.redo_enabled = false;
        tracing::debug!("reset to {}", self.state);
    }

    /// Forgets all history, keeping the current state.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.future.clear();
        self.redo_enabled = false;
        tracing::debug!("history cleared at {}", self.state);
    }

    /// Previously visited states, oldest first.
    pub fn history(&self) -> &[State] {
        &self.history
    }

    /// Undone states, next redo target last. May be stale; see [`Self::can_redo`].
    pub fn future(&self) -> &[State] {
        &self.future
    }

    pub fn redo_enabled(&self) -> bool {
        self.redo_enabled
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        self.redo_enabled && !self.future.is_empty()
    }
}
