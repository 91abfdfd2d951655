//! Builder API for ergonomic state machine construction.
//!
//! This module provides a fluent builder and macros for wiring state
//! machines with minimal boilerplate while keeping the wiring checked.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::StateMachineBuilder;

use crate::core::{DrivenEvent, State};
use crate::machine::{BehaviorHandler, FnHandler, HandlerError, StateContext, Subject};
use std::sync::Arc;

/// Create a shared closure-backed handler, ready for
/// [`StateMachineBuilder::handlers`].
///
/// # Example
///
/// ```
/// use switchyard::builder::handler_fn;
/// use switchyard::core::DrivenEvent;
/// use switchyard::machine::BehaviorHandler;
/// use switchyard::state_enum;
///
/// state_enum! {
///     enum Job {
///         Queued,
///         Running,
///     }
/// }
///
/// let start = DrivenEvent::new("start", Job::Queued, Job::Running);
/// let handler = handler_fn::<String, Job, _>(start, |ctx| {
///     println!("{} started", ctx.subject_id());
///     Ok(())
/// });
/// assert_eq!(handler.driven_event().name(), "start");
/// ```
pub fn handler_fn<T, S, F>(event: DrivenEvent<S>, action: F) -> Arc<dyn BehaviorHandler<T, S>>
where
    T: Subject + 'static,
    S: State + 'static,
    F: Fn(&StateContext<T, S>) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    Arc::new(FnHandler::new(event, action))
}
