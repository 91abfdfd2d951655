//! Observer trait and registration handles.

use crate::bus::event::Event;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Error type returned by a failing observer.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

pub type ObserverResult = Result<(), ObserverError>;

/// Callback notified when a matching event is published.
///
/// Errors and panics raised by `update` are caught and logged by the bus;
/// they never reach the publisher or stop other observers.
pub trait Observer<E: Event>: Send + Sync {
    fn update(&self, event: &E) -> ObserverResult;

    /// Run on the bus's dispatch pool instead of the publishing thread.
    fn is_async(&self) -> bool {
        false
    }

    /// Higher values are notified first.
    fn priority(&self) -> i32 {
        0
    }

    /// Optional name for diagnostics.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Handle returned on registration, used to remove the observer again.
///
/// One observer instance has one id, however many lists it is registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(Uuid);

impl ObserverId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An observer paired with its registration handle.
pub(crate) struct Registration<E: Event> {
    pub(crate) id: ObserverId,
    pub(crate) observer: Arc<dyn Observer<E>>,
}

impl<E: Event> Registration<E> {
    pub(crate) fn new(observer: Arc<dyn Observer<E>>) -> Self {
        Self::with_id(ObserverId::new(), observer)
    }

    pub(crate) fn with_id(id: ObserverId, observer: Arc<dyn Observer<E>>) -> Self {
        Self { id, observer }
    }
}

impl<E: Event> Clone for Registration<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            observer: Arc::clone(&self.observer),
        }
    }
}

type Callback<E> = Box<dyn Fn(&E) -> ObserverResult + Send + Sync>;

/// An observer built from a closure.
///
/// # Example
///
/// ```rust
/// use switchyard::bus::{BasicEvent, FnObserver, Observer};
///
/// let audit = FnObserver::new(|event: &BasicEvent| {
///     println!("audit: {}", event.event_type);
///     Ok(())
/// })
/// .named("audit")
/// .with_priority(10)
/// .asynchronous();
///
/// assert_eq!(audit.priority(), 10);
/// assert!(audit.is_async());
/// assert_eq!(audit.name(), "audit");
/// ```
pub struct FnObserver<E: Event> {
    name: String,
    priority: i32,
    is_async: bool,
    callback: Callback<E>,
}

impl<E: Event> FnObserver<E> {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&E) -> ObserverResult + Send + Sync + 'static,
    {
        Self {
            name: "anonymous".to_string(),
            priority: 0,
            is_async: false,
            callback: Box::new(callback),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Wrap in an `Arc` for registration.
    pub fn shared(self) -> Arc<dyn Observer<E>> {
        Arc::new(self)
    }
}

impl<E: Event> Observer<E> for FnObserver<E> {
    fn update(&self, event: &E) -> ObserverResult {
        (self.callback)(event)
    }

    fn is_async(&self) -> bool {
        self.is_async
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<E: Event> fmt::Debug for FnObserver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnObserver")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("is_async", &self.is_async)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::BasicEvent;

    struct Defaults;

    impl Observer<BasicEvent> for Defaults {
        fn update(&self, _event: &BasicEvent) -> ObserverResult {
            Ok(())
        }
    }

    #[test]
    fn trait_defaults_are_sync_priority_zero() {
        let observer = Defaults;

        assert!(!observer.is_async());
        assert_eq!(observer.priority(), 0);
        assert_eq!(observer.name(), "anonymous");
    }

    #[test]
    fn fn_observer_forwards_errors() {
        let observer = FnObserver::new(|event: &BasicEvent| {
            if event.event_type == "bad" {
                Err("rejected".into())
            } else {
                Ok(())
            }
        });

        assert!(observer.update(&BasicEvent::new("good", "test")).is_ok());
        let err = observer.update(&BasicEvent::new("bad", "test")).unwrap_err();
        assert_eq!(err.to_string(), "rejected");
    }

    #[test]
    fn registration_ids_are_unique() {
        let a = Registration::new(FnObserver::new(|_: &BasicEvent| Ok(())).shared());
        let b = Registration::new(FnObserver::new(|_: &BasicEvent| Ok(())).shared());

        assert_ne!(a.id, b.id);
        assert_eq!(a.clone().id, a.id);
    }
}
