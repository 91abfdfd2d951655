//! Behavior handlers and the registry that maps each driven event to one.

use crate::builder::BuildError;
use crate::core::{DrivenEvent, State};
use crate::machine::context::{StateContext, Subject};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Error type returned by handler side effects.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Performs the side effects of exactly one driven event.
///
/// The handler runs after the new state has been persisted, once per
/// applied transition, with the fully populated context.
pub trait BehaviorHandler<T: Subject, S: State>: Send + Sync {
    /// The event this handler is registered under.
    fn driven_event(&self) -> &DrivenEvent<S>;

    fn trigger_behavior_handle(&self, context: &StateContext<T, S>) -> Result<(), HandlerError>;
}

/// Type alias for closure-backed handler actions.
pub type HandlerAction<T, S> =
    Box<dyn Fn(&StateContext<T, S>) -> Result<(), HandlerError> + Send + Sync>;

/// A handler built from a closure.
///
/// # Example
///
/// ```rust
/// use switchyard::core::DrivenEvent;
/// use switchyard::machine::{BehaviorHandler, FnHandler};
/// use switchyard::state_enum;
///
/// state_enum! {
///     enum Parcel {
///         Packed,
///         Shipped,
///     }
/// }
///
/// let ship = DrivenEvent::new("ship", Parcel::Packed, Parcel::Shipped);
/// let handler = FnHandler::<String, Parcel>::new(ship, |ctx| {
///     println!("shipping {}", ctx.subject_id());
///     Ok(())
/// });
///
/// assert_eq!(handler.driven_event().name(), "ship");
/// ```
pub struct FnHandler<T: Subject, S: State> {
    event: DrivenEvent<S>,
    action: HandlerAction<T, S>,
}

impl<T: Subject, S: State> FnHandler<T, S> {
    pub fn new<F>(event: DrivenEvent<S>, action: F) -> Self
    where
        F: Fn(&StateContext<T, S>) -> Result<(), HandlerError> + Send + Sync + 'static,
    {
        Self {
            event,
            action: Box::new(action),
        }
    }

    /// A handler with no side effects.
    pub fn noop(event: DrivenEvent<S>) -> Self {
        Self::new(event, |_| Ok(()))
    }
}

impl<T: Subject, S: State> BehaviorHandler<T, S> for FnHandler<T, S> {
    fn driven_event(&self) -> &DrivenEvent<S> {
        &self.event
    }

    fn trigger_behavior_handle(&self, context: &StateContext<T, S>) -> Result<(), HandlerError> {
        (self.action)(context)
    }
}

/// Read-only mapping from event name to its single handler.
pub struct HandlerRegistry<T: Subject, S: State> {
    handlers: HashMap<String, Arc<dyn BehaviorHandler<T, S>>>,
}

impl<T: Subject, S: State> HandlerRegistry<T, S> {
    /// Build the registry, failing if any event has more than one handler.
    ///
    /// Every duplicated event name is reported, not just the first.
    pub fn from_handlers(
        handlers: Vec<Arc<dyn BehaviorHandler<T, S>>>,
    ) -> Result<Self, BuildError> {
        let mut seen = HashSet::new();
        let checks: Vec<Validation<(), NonEmptyVec<String>>> = handlers
            .iter()
            .map(|handler| {
                let name = handler.driven_event().name().to_string();
                if seen.insert(name.clone()) {
                    Validation::success(())
                } else {
                    Validation::fail(name)
                }
            })
            .collect();

        match Validation::all_vec(checks) {
            Validation::Success(_) => {}
            Validation::Failure(duplicates) => {
                let mut names: Vec<String> = duplicates.iter().cloned().collect();
                names.sort();
                names.dedup();
                return Err(BuildError::DuplicateHandlers(names));
            }
        }

        let handlers = handlers
            .into_iter()
            .map(|handler| (handler.driven_event().name().to_string(), handler))
            .collect();

        Ok(Self { handlers })
    }

    pub fn get(&self, event: &DrivenEvent<S>) -> Option<&Arc<dyn BehaviorHandler<T, S>>> {
        self.handlers.get(event.name())
    }

    pub fn contains(&self, event: &DrivenEvent<S>) -> bool {
        self.handlers.contains_key(event.name())
    }

    /// Registered event names, sorted.
    pub fn event_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<T: Subject, S: State> fmt::Debug for HandlerRegistry<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("events", &self.event_names())
            .finish()
    }
}
