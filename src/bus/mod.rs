//! Concurrent observer notification.
//!
//! Observers register globally or for a single event type. Publishing an
//! event notifies synchronous observers on the caller's thread in
//! descending priority order and hands asynchronous observers to a bounded
//! [`DispatchPool`] owned by the bus. A failing or panicking observer is
//! logged and counted in the [`PublishReport`]; it never affects the
//! publisher or the other observers.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use switchyard::bus::{AsyncEventBus, BasicEvent, EventBus, FnObserver, Observable};
//!
//! let bus = AsyncEventBus::with_defaults().unwrap();
//! bus.add_observer(
//!     FnObserver::new(|event: &BasicEvent| {
//!         if event.payload.is_null() {
//!             return Err("empty payload".into());
//!         }
//!         Ok(())
//!     })
//!     .named("validator")
//!     .with_priority(10)
//!     .shared(),
//! );
//! bus.add_observer(FnObserver::new(|_: &BasicEvent| Ok(())).named("sink").shared());
//!
//! let report = bus.publish(BasicEvent::new("user.created", "signup"));
//! assert_eq!(report.sync_failed, 1);
//! assert_eq!(report.sync_delivered, 1);
//!
//! assert!(bus.shutdown(Duration::from_secs(1)).drained);
//! ```

mod dispatch;
mod error;
mod event;
mod event_bus;
mod observable;
mod observer;
mod pool;
mod registry;

pub use dispatch::PublishReport;
pub use error::BusError;
pub use event::{BasicEvent, Event};
pub use event_bus::{AsyncEventBus, EventBus};
pub use observable::{Observable, SimpleObservable};
pub use observer::{FnObserver, Observer, ObserverError, ObserverId, ObserverResult};
pub use pool::{DispatchPool, ShutdownReport, Submission};
pub use registry::ObserverRegistry;
