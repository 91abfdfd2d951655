//! Runtime configuration for state machines and event buses.
//!
//! Both structs deserialize with `#[serde(default)]`, so an embedding
//! application can load a partial JSON document and get defaults for
//! everything it leaves out.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised when a configuration cannot be used.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("worker_threads must be at least 1")]
    NoWorkers,

    #[error("max_pending must be at least 1")]
    NoPendingCapacity,

    #[error("Invalid configuration document: {0}")]
    Malformed(String),
}

/// State machine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Serialize `execute` calls that target the same subject, making
    /// read/compare/write/handle atomic per subject within one machine.
    pub serialize_per_subject: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            serialize_per_subject: true,
        }
    }
}

/// What the dispatch pool does when `max_pending` tasks are already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop the task, log it, and count it as rejected
    Reject,

    /// Run the task on the submitting thread
    CallerRuns,
}

/// Event bus settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Worker threads of the bus-owned runtime
    pub worker_threads: usize,

    /// Upper bound on queued plus running async notifications
    pub max_pending: usize,

    pub overflow: OverflowPolicy,

    /// Synchronous observers slower than this are logged
    pub slow_observer_threshold_ms: u64,

    /// Default drain bound used by `shutdown_default`
    pub shutdown_timeout_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            max_pending: 1024,
            overflow: OverflowPolicy::Reject,
            slow_observer_threshold_ms: 250,
            shutdown_timeout_ms: 60_000,
        }
    }
}

impl BusConfig {
    /// Parse a JSON document, filling unspecified fields with defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.max_pending == 0 {
            return Err(ConfigError::NoPendingCapacity);
        }
        Ok(())
    }

    pub fn slow_observer_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_observer_threshold_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = n;
        self
    }

    pub fn max_pending(mut self, n: usize) -> Self {
        self.max_pending = n;
        self
    }

    pub fn overflow(mut self, policy: OverflowPolicy) -> Self {
        self.overflow = policy;
        self
    }

    pub fn slow_observer_threshold_ms(mut self, ms: u64) -> Self {
        self.slow_observer_threshold_ms = ms;
        self
    }
}
