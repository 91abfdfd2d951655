//! State machine that applies driven events to subjects.

use crate::config::MachineConfig;
use crate::core::{DrivenEvent, State};
use crate::machine::assistant::StateAssistant;
use crate::machine::context::{StateContext, Subject};
use crate::machine::error::MachineError;
use crate::machine::handler::{BehaviorHandler, HandlerRegistry};
use dashmap::DashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

/// Result of a transition that did not fail.
#[derive(Clone, Debug)]
pub enum TransitionOutcome<T: Subject, S: State> {
    /// State persisted and handler invoked
    Applied(StateContext<T, S>),

    /// Authoritative state did not match the event's required state.
    /// Nothing was written and no handler ran.
    Stale {
        expected: S,
        actual: S,
        context: StateContext<T, S>,
    },
}

impl<T: Subject, S: State> TransitionOutcome<T, S> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    pub fn context(&self) -> &StateContext<T, S> {
        match self {
            Self::Applied(context) => context,
            Self::Stale { context, .. } => context,
        }
    }
}

/// Validates transitions against authoritative state, persists them, and
/// runs the one handler registered for each event.
///
/// `execute` may be called concurrently. With
/// [`MachineConfig::serialize_per_subject`] enabled (the default), calls for
/// the same subject id are serialized so that read, compare, write and
/// handle happen as one step. This guards a single machine instance only;
/// it is not a lock on the assistant's store.
pub struct StateMachine<T: Subject, S: State> {
    assistant: Arc<dyn StateAssistant<T, S>>,
    handlers: HandlerRegistry<T, S>,
    config: MachineConfig,
    subject_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<T: Subject, S: State> StateMachine<T, S> {
    pub fn new(
        assistant: Arc<dyn StateAssistant<T, S>>,
        handlers: HandlerRegistry<T, S>,
        config: MachineConfig,
    ) -> Self {
        Self {
            assistant,
            handlers,
            config,
            subject_locks: DashMap::new(),
        }
    }

    pub fn has_handler(&self, event: &DrivenEvent<S>) -> bool {
        self.handlers.contains(event)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Names of every event this machine can apply.
    pub fn events(&self) -> Vec<&str> {
        self.handlers.event_names()
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Apply `event` to `subject`.
    ///
    /// Fails with [`MachineError::MissingHandler`] before touching the
    /// store when no handler is registered. A failed read or write aborts
    /// with [`MachineError::Assistant`] and the handler never runs.
    pub fn execute(
        &self,
        event: &DrivenEvent<S>,
        subject: T,
    ) -> Result<TransitionOutcome<T, S>, MachineError> {
        let handler = self
            .handlers
            .get(event)
            .ok_or_else(|| MachineError::MissingHandler {
                event: event.name().to_string(),
            })?;

        let mut context = StateContext::new(event, subject);

        let lease = self
            .config
            .serialize_per_subject
            .then(|| self.lease_subject(context.subject_id()));
        let guard = lease
            .as_ref()
            .map(|l| l.lock.lock().unwrap_or_else(PoisonError::into_inner));

        let outcome = self.apply(&**handler, &mut context);

        drop(guard);
        drop(lease);

        outcome.map(|stale| match stale {
            Some(actual) => TransitionOutcome::Stale {
                expected: event.required_state().clone(),
                actual,
                context,
            },
            None => TransitionOutcome::Applied(context),
        })
    }

    /// Returns the authoritative state when the transition is stale.
    fn apply(
        &self,
        handler: &dyn BehaviorHandler<T, S>,
        context: &mut StateContext<T, S>,
    ) -> Result<Option<S>, MachineError> {
        let authoritative = self.assistant.read(context)?;

        if !context.event().applies_to(&authoritative) {
            warn!(
                event = %context.event().name(),
                subject = %context.subject_id(),
                expected = %context.event().required_state().name(),
                actual = %authoritative.name(),
                "Stale transition rejected"
            );
            context.observe_current(authoritative.clone());
            return Ok(Some(authoritative));
        }
        context.observe_current(authoritative);

        self.assistant.write(context)?;

        handler
            .trigger_behavior_handle(context)
            .map_err(|source| MachineError::HandlerFailed {
                event: context.event().name().to_string(),
                subject: context.subject_id().to_string(),
                source,
            })?;

        debug!(
            event = %context.event().name(),
            subject = %context.subject_id(),
            from = %context.current_state().name(),
            to = %context.final_state().name(),
            "Transition applied"
        );
        Ok(None)
    }

    fn lease_subject(&self, subject_id: &str) -> SubjectLease<'_> {
        let lock = self
            .subject_locks
            .entry(subject_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        SubjectLease {
            table: &self.subject_locks,
            subject_id: subject_id.to_string(),
            lock,
        }
    }
}

/// A caller's hold on one entry of the per-subject lock table.
///
/// Dropping the last lease removes the entry, including while unwinding
/// from a panicking handler, so the table does not grow with every subject
/// ever seen.
struct SubjectLease<'a> {
    table: &'a DashMap<String, Arc<Mutex<()>>>,
    subject_id: String,
    lock: Arc<Mutex<()>>,
}

impl Drop for SubjectLease<'_> {
    fn drop(&mut self) {
        // One reference in the table, one held here.
        self.table
            .remove_if(&self.subject_id, |_, lock| Arc::strong_count(lock) == 2);
    }
}

impl<T: Subject, S: State> fmt::Debug for StateMachine<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("handlers", &self.handlers)
            .field("config", &self.config)
            .field("locked_subjects", &self.subject_locks.len())
            .finish()
    }
}
