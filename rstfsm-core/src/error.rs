//! Core error types.

use thiserror::Error;

/// Errors from the state machine engine.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("unknown state: '{state}'")]
    UnknownState { state: String },

    #[error("unknown transition: no event '{event}' in state '{state}'")]
    UnknownTransition { state: String, event: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Returns a stable error code suitable for display and scripting.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::InvalidConfiguration { .. } => "INVALID_CONFIGURATION",
            CoreError::UnknownState { .. } => "UNKNOWN_STATE",
            CoreError::UnknownTransition { .. } => "UNKNOWN_TRANSITION",
            CoreError::Json(_) => "INVALID_CONFIGURATION",
        }
    }
}
