//! Event bus errors.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors returned to publishers and bus constructors.
///
/// Observer failures are never reported here; they are logged and counted
/// in the publish report.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("Event bus has been shut down")]
    ShutDown,

    #[error("Dispatch pool saturated ({pending} notifications pending)")]
    Saturated { pending: usize },

    #[error("Failed to start dispatch runtime: {0}")]
    Runtime(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
