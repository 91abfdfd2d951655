//! Errors raised by the state machine.

use crate::machine::assistant::AssistantError;
use crate::machine::handler::HandlerError;
use thiserror::Error;

/// Errors that abort a transition.
///
/// Stale transitions are not errors; they come back as
/// `TransitionOutcome::Stale`.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("No behavior handler registered for event '{event}'")]
    MissingHandler { event: String },

    #[error(transparent)]
    Assistant(#[from] AssistantError),

    #[error("Behavior handler for '{event}' failed on subject '{subject}': {source}")]
    HandlerFailed {
        event: String,
        subject: String,
        #[source]
        source: HandlerError,
    },
}

impl MachineError {
    /// Configuration defects that retrying cannot fix.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingHandler { .. })
    }
}
