//! Build errors for state machine construction.

use thiserror::Error;

/// Errors that can occur when wiring a state machine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("State assistant not specified. Call .assistant(store) before .build()")]
    MissingAssistant,

    #[error("Exactly one state assistant is required, {0} were supplied")]
    AmbiguousAssistant(usize),

    #[error("No behavior handlers registered. Add at least one handler")]
    NoHandlers,

    #[error("Multiple behavior handlers registered for events: {}", .0.join(", "))]
    DuplicateHandlers(Vec<String>),
}
