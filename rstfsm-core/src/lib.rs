//! # rstfsm-core
//!
//! Finite state machine engine for rstfsm.
//!
//! This crate provides:
//! - Machine configuration parsing and validation
//! - Event-driven and direct state transitions
//! - Linear undo/redo of visited states
//! - A lock-guarded handle for multi-threaded hosts

pub mod definition;
pub mod error;
pub mod machine;
pub mod shared;

pub use definition::{MachineConfig, MachineConfigRaw, State, StateConfigRaw, StateDefinition};
pub use error::CoreError;
pub use machine::{ApplyResult, Machine};
pub use shared::SharedMachine;
