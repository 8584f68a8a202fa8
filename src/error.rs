//! CLI error types.

use rstfsm_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the `rstfsm` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse '{}': {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("no machine file given (use --machine or RSTFSM_MACHINE)")]
    NoMachine,

    #[error("bad step '{step}': {reason}")]
    BadStep { step: String, reason: String },

    #[error("{0} [{code}]", code = .0.error_code())]
    Core(#[from] CoreError),

    #[error("write error: {0}")]
    Output(#[from] std::io::Error),

    #[error("readline error: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

impl CliError {
    pub fn bad_step(step: impl Into<String>, reason: impl Into<String>) -> Self {
        CliError::BadStep {
            step: step.into(),
            reason: reason.into(),
        }
    }
}
