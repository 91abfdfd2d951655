//! State assistants: the persistence boundary of the state machine.

use crate::core::{State, StateHistory};
use crate::machine::context::{StateContext, Subject};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;
use tracing::trace;

/// Errors reported by a state assistant.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AssistantError {
    #[error("No persisted state for subject '{subject}'")]
    NotFound { subject: String },

    #[error("Failed to persist state for subject '{subject}': {reason}")]
    Persistence { subject: String, reason: String },
}

/// Reads and writes a subject's authoritative state.
///
/// Implementations own the backing store. `read` must return the current
/// state for `context.subject_id()` or [`AssistantError::NotFound`];
/// `write` must durably persist `context.final_state()` or fail, in which
/// case the transition is aborted before any handler runs.
pub trait StateAssistant<T: Subject, S: State>: Send + Sync {
    fn read(&self, context: &StateContext<T, S>) -> Result<S, AssistantError>;

    fn write(&self, context: &StateContext<T, S>) -> Result<(), AssistantError>;
}

#[derive(Clone, Debug)]
struct Record<S: State> {
    state: S,
    history: StateHistory<S>,
}

/// Concurrent in-process store keyed by subject id.
///
/// Keeps the current state plus a transition history per subject. Useful
/// for tests and for embedding where durability is not required.
///
/// Histories are immutable values, so every write copies the subject's
/// history. Long-lived subjects should use
/// [`with_history_limit`](Self::with_history_limit) to keep that copy small.
#[derive(Debug)]
pub struct InMemoryStateAssistant<S: State> {
    records: DashMap<String, Record<S>>,
    writes: AtomicUsize,
    history_limit: Option<usize>,
}

impl<S: State> Default for InMemoryStateAssistant<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: State> InMemoryStateAssistant<S> {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            writes: AtomicUsize::new(0),
            history_limit: None,
        }
    }

    /// Keep only the most recent `limit` transitions per subject.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Set a subject's state directly, bypassing transition rules.
    pub fn seed(&self, subject_id: impl Into<String>, state: S) {
        self.records.insert(
            subject_id.into(),
            Record {
                state,
                history: StateHistory::new(),
            },
        );
    }

    pub fn state_of(&self, subject_id: &str) -> Option<S> {
        self.records.get(subject_id).map(|r| r.state.clone())
    }

    pub fn history_of(&self, subject_id: &str) -> Option<StateHistory<S>> {
        self.records.get(subject_id).map(|r| r.history.clone())
    }

    /// Number of successful writes since construction.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Subject, S: State> StateAssistant<T, S> for InMemoryStateAssistant<S> {
    fn read(&self, context: &StateContext<T, S>) -> Result<S, AssistantError> {
        self.records
            .get(context.subject_id())
            .map(|r| r.state.clone())
            .ok_or_else(|| AssistantError::NotFound {
                subject: context.subject_id().to_string(),
            })
    }

    fn write(&self, context: &StateContext<T, S>) -> Result<(), AssistantError> {
        let transition = context.to_transition();
        let mut record = self
            .records
            .entry(context.subject_id().to_string())
            .or_insert_with(|| Record {
                state: context.current_state().clone(),
                history: StateHistory::new(),
            });
        let history = record.history.record(transition);
        record.history = match self.history_limit {
            Some(limit) => history.keep_last(limit),
            None => history,
        };
        record.state = context.final_state().clone();
        drop(record);

        self.writes.fetch_add(1, Ordering::SeqCst);
        trace!(
            subject = %context.subject_id(),
            state = %context.final_state().name(),
            "State persisted"
        );
        Ok(())
    }
}
