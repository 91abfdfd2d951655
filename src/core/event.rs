//! Driven events: the named edges of a state graph.

use super::state::State;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A named transition from a required starting state to a result state.
///
/// Driven events are defined once per transition type and never change.
/// Two events are the same event when their names match; the state
/// machine keys its handler registry on the name.
///
/// # Example
///
/// ```rust
/// use switchyard::core::{DrivenEvent, State};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// enum Door { Open, Closed }
///
/// impl State for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///         }
///     }
/// }
///
/// let close = DrivenEvent::new("close", Door::Open, Door::Closed);
/// assert_eq!(close.name(), "close");
/// assert_eq!(close.required_state(), &Door::Open);
/// assert_eq!(close.result_state(), &Door::Closed);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DrivenEvent<S: State> {
    name: String,
    required_state: S,
    result_state: S,
}

impl<S: State> DrivenEvent<S> {
    pub fn new(name: impl Into<String>, required_state: S, result_state: S) -> Self {
        Self {
            name: name.into(),
            required_state,
            result_state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// State the subject must be in for this event to apply.
    pub fn required_state(&self) -> &S {
        &self.required_state
    }

    /// State the subject is moved to when this event applies.
    pub fn result_state(&self) -> &S {
        &self.result_state
    }

    /// True when `current` satisfies the required starting state.
    pub fn applies_to(&self, current: &S) -> bool {
        self.required_state.same_as(current)
    }
}

impl<S: State> PartialEq for DrivenEvent<S> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<S: State> Eq for DrivenEvent<S> {}

impl<S: State> Hash for DrivenEvent<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<S: State> fmt::Display for DrivenEvent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.name,
            self.required_state.name(),
            self.result_state.name()
        )
    }
}
