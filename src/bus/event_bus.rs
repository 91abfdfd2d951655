//! Publish/subscribe bus with type-scoped observers.

use crate::bus::dispatch::{self, AsyncDelivery, PublishReport};
use crate::bus::error::BusError;
use crate::bus::event::Event;
use crate::bus::observable::Observable;
use crate::bus::observer::{Observer, ObserverId};
use crate::bus::pool::{DispatchPool, ShutdownReport};
use crate::bus::registry::ObserverRegistry;
use crate::config::BusConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An observable that also routes events by type.
pub trait EventBus<E: Event>: Observable<E> {
    /// Notify observers now. Synchronous observers have finished when this
    /// returns; asynchronous ones have been scheduled.
    fn publish(&self, event: E) -> PublishReport {
        self.notify_observers(Arc::new(event))
    }

    /// Hand the whole notification to the dispatch pool and return at once.
    ///
    /// The notification occupies one pool job; its asynchronous observers
    /// run on that job after the synchronous ones. Once accepted it is
    /// delivered in full unless shutdown gives up waiting.
    fn publish_async(&self, event: E) -> Result<(), BusError>;

    /// Register an observer that only sees events of `event_type`.
    fn register(&self, event_type: &str, observer: Arc<dyn Observer<E>>) -> ObserverId;

    fn unregister(&self, id: ObserverId) -> bool {
        self.remove_observer(id)
    }
}

struct BusInner<E: Event> {
    registry: ObserverRegistry<E>,
    pool: DispatchPool,
    config: BusConfig,
}

impl<E: Event> BusInner<E> {
    fn notify(&self, event: Arc<E>, delivery: AsyncDelivery<'_>) -> PublishReport {
        let observers = self.registry.snapshot(Some(event.event_type()));
        dispatch::deliver(
            observers,
            event,
            delivery,
            self.config.slow_observer_threshold(),
        )
    }
}

/// Event bus backed by a bounded dispatch pool.
///
/// Cloning is cheap and every clone shares the same observers and pool.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use switchyard::bus::{AsyncEventBus, BasicEvent, EventBus, FnObserver};
///
/// let bus = AsyncEventBus::with_defaults().unwrap();
/// let seen = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&seen);
///
/// bus.register(
///     "order.paid",
///     FnObserver::new(move |_: &BasicEvent| {
///         counter.fetch_add(1, Ordering::SeqCst);
///         Ok(())
///     })
///     .shared(),
/// );
///
/// bus.publish(BasicEvent::new("order.paid", "billing"));
/// bus.publish(BasicEvent::new("order.shipped", "warehouse"));
///
/// assert_eq!(seen.load(Ordering::SeqCst), 1);
/// bus.shutdown_default();
/// ```
pub struct AsyncEventBus<E: Event> {
    inner: Arc<BusInner<E>>,
}

impl<E: Event> Clone for AsyncEventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Event> AsyncEventBus<E> {
    pub fn new(config: BusConfig) -> Result<Self, BusError> {
        let pool = DispatchPool::new(&config)?;
        debug!(
            worker_threads = config.worker_threads,
            max_pending = config.max_pending,
            "Event bus started"
        );
        Ok(Self {
            inner: Arc::new(BusInner {
                registry: ObserverRegistry::new(),
                pool,
                config,
            }),
        })
    }

    pub fn with_defaults() -> Result<Self, BusError> {
        Self::new(BusConfig::default())
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &ObserverRegistry<E> {
        &self.inner.registry
    }

    /// Pool jobs queued or running.
    pub fn in_flight(&self) -> usize {
        self.inner.pool.in_flight()
    }

    /// Stop accepting async work and wait up to `timeout` for it to finish.
    ///
    /// Must be called outside an asynchronous execution context.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.inner.pool.shutdown(timeout)
    }

    /// [`shutdown`](Self::shutdown) with the configured timeout.
    pub fn shutdown_default(&self) -> ShutdownReport {
        self.shutdown(self.inner.config.shutdown_timeout())
    }
}

impl<E: Event> Observable<E> for AsyncEventBus<E> {
    fn add_observer(&self, observer: Arc<dyn Observer<E>>) -> ObserverId {
        self.inner.registry.add_global(observer)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        self.inner.registry.remove(id)
    }

    fn notify_observers(&self, event: Arc<E>) -> PublishReport {
        self.inner.notify(event, AsyncDelivery::Pool(&self.inner.pool))
    }

    fn observer_count(&self) -> usize {
        self.inner.registry.len()
    }
}

impl<E: Event> EventBus<E> for AsyncEventBus<E> {
    fn publish_async(&self, event: E) -> Result<(), BusError> {
        let inner = Arc::clone(&self.inner);
        let event = Arc::new(event);
        self.inner.pool.submit(move || {
            inner.notify(event, AsyncDelivery::Inline);
        })?;
        Ok(())
    }

    fn register(&self, event_type: &str, observer: Arc<dyn Observer<E>>) -> ObserverId {
        self.inner.registry.add_scoped(event_type, observer)
    }
}

impl<E: Event> fmt::Debug for AsyncEventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncEventBus")
            .field("registry", &self.inner.registry)
            .field("pool", &self.inner.pool)
            .finish()
    }
}
