//! Per-transition context handed to assistants and handlers.

use crate::core::{DrivenEvent, State, StateTransition};
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use uuid::Uuid;

/// An entity that moves through a state graph.
///
/// The identity correlates a transition with the subject's persisted state;
/// it is also the key the state machine serializes concurrent calls on.
pub trait Subject: Clone + Debug + Send + Sync {
    fn subject_id(&self) -> String;
}

impl Subject for String {
    fn subject_id(&self) -> String {
        self.clone()
    }
}

impl Subject for &'static str {
    fn subject_id(&self) -> String {
        (*self).to_string()
    }
}

/// Mutable record of one transition attempt.
///
/// A fresh context is built for every `execute` call and is owned by that
/// call alone. Only the state machine mutates it; assistants and handlers
/// see it by shared reference. It is handed back to the caller inside the
/// transition outcome as an audit record.
#[derive(Clone, Debug)]
pub struct StateContext<T: Subject, S: State> {
    id: Uuid,
    current_state: S,
    final_state: S,
    event: DrivenEvent<S>,
    subject: T,
    subject_id: String,
    started_at: DateTime<Utc>,
}

impl<T: Subject, S: State> StateContext<T, S> {
    /// Populate a context from an event and its subject.
    ///
    /// `current_state` starts out as the event's required state and is
    /// replaced by the authoritative state once the assistant has been read.
    pub fn new(event: &DrivenEvent<S>, subject: T) -> Self {
        let subject_id = subject.subject_id();
        Self {
            id: Uuid::new_v4(),
            current_state: event.required_state().clone(),
            final_state: event.result_state().clone(),
            event: event.clone(),
            subject,
            subject_id,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_state(&self) -> &S {
        &self.current_state
    }

    /// The state an applied transition persists.
    pub fn final_state(&self) -> &S {
        &self.final_state
    }

    pub fn event(&self) -> &DrivenEvent<S> {
        &self.event
    }

    pub fn subject(&self) -> &T {
        &self.subject
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub(crate) fn observe_current(&mut self, authoritative: S) {
        self.current_state = authoritative;
    }

    /// Audit record for history tracking.
    pub fn to_transition(&self) -> StateTransition<S> {
        StateTransition {
            from: self.current_state.clone(),
            to: self.final_state.clone(),
            event: self.event.name().to_string(),
            context_id: self.id,
            timestamp: Utc::now(),
        }
    }
}
