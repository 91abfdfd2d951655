//! Fault-isolated delivery of one event to an ordered observer set.

use crate::bus::event::Event;
use crate::bus::observer::Registration;
use crate::bus::pool::{DispatchPool, Submission};
use serde::Serialize;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{trace, warn};

/// Summary of one notification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Synchronous observers that returned `Ok`
    pub sync_delivered: usize,
    /// Synchronous observers that returned an error or panicked
    pub sync_failed: usize,
    /// Asynchronous observers handed to the pool, or run off the publisher's
    /// thread by a deferred notification
    pub async_scheduled: usize,
    /// Asynchronous observers dropped because the pool refused them
    pub async_rejected: usize,
}

impl PublishReport {
    /// Observers that were, or will be, called.
    pub fn attempted(&self) -> usize {
        self.sync_delivered + self.sync_failed + self.async_scheduled
    }
}

/// Where asynchronous observers of one notification run.
#[derive(Clone, Copy)]
pub(crate) enum AsyncDelivery<'a> {
    /// One pool job per observer
    Pool(&'a DispatchPool),
    /// On the current thread, after the synchronous observers. For
    /// notifications that already run as a pool job: they hold a permit and
    /// must finish even after the pool stops accepting work.
    Inline,
}

/// Notify `observers`, which must already be in priority order.
///
/// Synchronous observers run here, in order. Asynchronous observers are
/// handled according to `delivery`.
pub(crate) fn deliver<E: Event>(
    observers: Vec<Registration<E>>,
    event: Arc<E>,
    delivery: AsyncDelivery<'_>,
    slow_threshold: Duration,
) -> PublishReport {
    let mut report = PublishReport::default();
    let (async_observers, sync_observers): (Vec<_>, Vec<_>) = observers
        .into_iter()
        .partition(|r| r.observer.is_async());

    for registration in &sync_observers {
        if invoke(registration, &event, Some(slow_threshold)) {
            report.sync_delivered += 1;
        } else {
            report.sync_failed += 1;
        }
    }

    let pool = match delivery {
        AsyncDelivery::Pool(pool) => pool,
        AsyncDelivery::Inline => {
            for registration in &async_observers {
                invoke(registration, &event, None);
                report.async_scheduled += 1;
            }
            return report;
        }
    };

    for registration in async_observers {
        let name = registration.observer.name().to_string();
        let event = Arc::clone(&event);
        match pool.submit(move || {
            invoke(&registration, &event, None);
        }) {
            Ok(Submission::Scheduled) | Ok(Submission::RanInline) => report.async_scheduled += 1,
            Err(e) => {
                warn!(observer = %name, error = %e, "Async observer not scheduled");
                report.async_rejected += 1;
            }
        }
    }

    report
}

/// Run one observer, containing errors and panics. Returns `true` on success.
pub(crate) fn invoke<E: Event>(
    registration: &Registration<E>,
    event: &E,
    slow_threshold: Option<Duration>,
) -> bool {
    let observer = &registration.observer;
    trace!(
        observer = %observer.name(),
        event_type = %event.event_type(),
        priority = observer.priority(),
        "Notifying observer"
    );

    let started = Instant::now();
    let result = panic::catch_unwind(AssertUnwindSafe(|| observer.update(event)));
    let elapsed = started.elapsed();

    if let Some(threshold) = slow_threshold {
        if elapsed > threshold {
            warn!(
                observer = %observer.name(),
                event_type = %event.event_type(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Slow synchronous observer is delaying the publisher"
            );
        }
    }

    match result {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(
                observer = %observer.name(),
                event_type = %event.event_type(),
                error = %e,
                "Observer update failed"
            );
            false
        }
        Err(payload) => {
            warn!(
                observer = %observer.name(),
                event_type = %event.event_type(),
                panic = %panic_message(payload.as_ref()),
                "Observer panicked"
            );
            false
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::BasicEvent;
    use crate::bus::observer::{FnObserver, Observer};
    use crate::config::BusConfig;
    use std::sync::Mutex;

    fn recording(
        name: &'static str,
        priority: i32,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Registration<BasicEvent> {
        let log = Arc::clone(log);
        Registration::new(
            FnObserver::new(move |_: &BasicEvent| {
                log.lock().unwrap().push(name);
                Ok(())
            })
            .named(name)
            .with_priority(priority)
            .shared(),
        )
    }

    #[test]
    fn sync_observers_run_in_given_order() {
        let pool = DispatchPool::new(&BusConfig::default()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let observers = vec![
            recording("a", 3, &log),
            recording("b", 2, &log),
            recording("c", 1, &log),
        ];

        let report = deliver(
            observers,
            Arc::new(BasicEvent::new("tick", "test")),
            AsyncDelivery::Pool(&pool),
            Duration::from_secs(1),
        );

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(report.sync_delivered, 3);
        assert_eq!(report.attempted(), 3);
    }

    #[test]
    fn errors_and_panics_are_contained() {
        let pool = DispatchPool::new(&BusConfig::default()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let failing = Registration::new(
            FnObserver::new(|_: &BasicEvent| Err("boom".into()))
                .with_priority(5)
                .shared(),
        );
        let panicking = Registration::new(
            FnObserver::new(|_: &BasicEvent| panic!("observer exploded"))
                .with_priority(4)
                .shared(),
        );

        let report = deliver(
            vec![failing, panicking, recording("survivor", 1, &log)],
            Arc::new(BasicEvent::new("tick", "test")),
            AsyncDelivery::Pool(&pool),
            Duration::from_secs(1),
        );

        assert_eq!(report.sync_failed, 2);
        assert_eq!(report.sync_delivered, 1);
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[test]
    fn async_observers_go_to_the_pool() {
        let pool = DispatchPool::new(&BusConfig::default()).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_async = Arc::clone(&log);
        let background: Arc<dyn Observer<BasicEvent>> = FnObserver::new(move |_: &BasicEvent| {
            log_async.lock().unwrap().push("background");
            Ok(())
        })
        .asynchronous()
        .shared();

        let report = deliver(
            vec![Registration::new(background)],
            Arc::new(BasicEvent::new("tick", "test")),
            AsyncDelivery::Pool(&pool),
            Duration::from_secs(1),
        );
        assert_eq!(report.async_scheduled, 1);

        assert!(pool.shutdown(Duration::from_secs(5)).drained);
        assert_eq!(*log.lock().unwrap(), vec!["background"]);
    }

    #[test]
    fn inline_delivery_runs_async_observers_on_current_thread() {
        let caller = std::thread::current().id();
        let ran_on = Arc::new(Mutex::new(Vec::new()));
        let slot = Arc::clone(&ran_on);
        let background: Arc<dyn Observer<BasicEvent>> = FnObserver::new(move |_: &BasicEvent| {
            slot.lock().unwrap().push(std::thread::current().id());
            Ok(())
        })
        .asynchronous()
        .shared();

        let report = deliver(
            vec![Registration::new(background)],
            Arc::new(BasicEvent::new("tick", "test")),
            AsyncDelivery::Inline,
            Duration::from_secs(1),
        );

        assert_eq!(report.async_scheduled, 1);
        assert_eq!(report.async_rejected, 0);
        assert_eq!(*ran_on.lock().unwrap(), vec![caller]);
    }

    #[test]
    fn panic_message_extracts_strings() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
        let other: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(owned.as_ref()), "owned");
        assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
