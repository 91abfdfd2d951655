//! The observable contract and its global-only implementation.

use crate::bus::dispatch::{self, AsyncDelivery, PublishReport};
use crate::bus::error::BusError;
use crate::bus::event::Event;
use crate::bus::observer::{Observer, ObserverId};
use crate::bus::pool::{DispatchPool, ShutdownReport};
use crate::bus::registry::ObserverRegistry;
use crate::config::BusConfig;
use std::sync::Arc;
use std::time::Duration;

/// Something observers can watch.
pub trait Observable<E: Event> {
    /// Register an observer for every event.
    fn add_observer(&self, observer: Arc<dyn Observer<E>>) -> ObserverId;

    /// Remove an observer wherever it is registered.
    fn remove_observer(&self, id: ObserverId) -> bool;

    /// Deliver `event` to every applicable observer, highest priority first.
    fn notify_observers(&self, event: Arc<E>) -> PublishReport;

    fn observer_count(&self) -> usize;
}

/// An observable with a single, global observer list.
///
/// Synchronous observers run on the notifying thread in priority order;
/// asynchronous observers run on the observable's own dispatch pool.
#[derive(Debug)]
pub struct SimpleObservable<E: Event> {
    registry: ObserverRegistry<E>,
    pool: DispatchPool,
    config: BusConfig,
}

impl<E: Event> SimpleObservable<E> {
    pub fn new() -> Result<Self, BusError> {
        Self::with_config(BusConfig::default())
    }

    pub fn with_config(config: BusConfig) -> Result<Self, BusError> {
        Ok(Self {
            registry: ObserverRegistry::new(),
            pool: DispatchPool::new(&config)?,
            config,
        })
    }

    pub fn pool(&self) -> &DispatchPool {
        &self.pool
    }

    /// Stop async delivery, waiting up to `timeout` for in-flight observers.
    pub fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.pool.shutdown(timeout)
    }
}

impl<E: Event> Observable<E> for SimpleObservable<E> {
    fn add_observer(&self, observer: Arc<dyn Observer<E>>) -> ObserverId {
        self.registry.add_global(observer)
    }

    fn remove_observer(&self, id: ObserverId) -> bool {
        self.registry.remove(id)
    }

    fn notify_observers(&self, event: Arc<E>) -> PublishReport {
        let observers = self.registry.snapshot(None);
        dispatch::deliver(
            observers,
            event,
            AsyncDelivery::Pool(&self.pool),
            self.config.slow_observer_threshold(),
        )
    }

    fn observer_count(&self) -> usize {
        self.registry.global_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::BasicEvent;
    use crate::bus::observer::FnObserver;
    use std::sync::Mutex;

    fn recorder(
        name: &'static str,
        priority: i32,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn Observer<BasicEvent>> {
        let log = Arc::clone(log);
        FnObserver::new(move |_: &BasicEvent| {
            log.lock().unwrap().push(name);
            Ok(())
        })
        .named(name)
        .with_priority(priority)
        .shared()
    }

    #[test]
    fn notifies_in_priority_order() {
        let observable = SimpleObservable::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        observable.add_observer(recorder("low", -1, &log));
        observable.add_observer(recorder("high", 10, &log));
        observable.add_observer(recorder("default", 0, &log));

        let report = observable.notify_observers(Arc::new(BasicEvent::new("ping", "test")));

        assert_eq!(report.sync_delivered, 3);
        assert_eq!(*log.lock().unwrap(), vec!["high", "default", "low"]);
    }

    #[test]
    fn removed_observer_is_not_notified() {
        let observable = SimpleObservable::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let id = observable.add_observer(recorder("gone", 0, &log));
        observable.add_observer(recorder("kept", 0, &log));

        assert!(observable.remove_observer(id));
        assert_eq!(observable.observer_count(), 1);

        observable.notify_observers(Arc::new(BasicEvent::new("ping", "test")));
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
    }

    #[test]
    fn async_observers_finish_before_shutdown_returns() {
        let observable = SimpleObservable::new().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_async = Arc::clone(&log);
        observable.add_observer(
            FnObserver::new(move |_: &BasicEvent| {
                std::thread::sleep(Duration::from_millis(20));
                log_async.lock().unwrap().push("async");
                Ok(())
            })
            .asynchronous()
            .shared(),
        );

        let report = observable.notify_observers(Arc::new(BasicEvent::new("ping", "test")));
        assert_eq!(report.async_scheduled, 1);

        assert!(observable.shutdown(Duration::from_secs(5)).drained);
        assert_eq!(*log.lock().unwrap(), vec!["async"]);
    }
}
