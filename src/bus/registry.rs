//! Concurrent observer registry.

use crate::bus::event::Event;
use crate::bus::observer::{Observer, ObserverId, Registration};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Global and type-scoped observer lists.
///
/// The global list is copy-on-write: publishers take a cheap snapshot and
/// iterate it while registrations swap in a new list. Type-scoped lists
/// live in a sharded concurrent map keyed by event type. No lock is held
/// while an observer runs.
pub struct ObserverRegistry<E: Event> {
    global: ArcSwap<Vec<Registration<E>>>,
    scoped: DashMap<String, Vec<Registration<E>>>,
}

impl<E: Event> Default for ObserverRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> ObserverRegistry<E> {
    pub fn new() -> Self {
        Self {
            global: ArcSwap::from_pointee(Vec::new()),
            scoped: DashMap::new(),
        }
    }

    /// Register an observer for every event.
    ///
    /// An observer already registered anywhere keeps its id; registering it
    /// twice in the same list is a no-op.
    pub fn add_global(&self, observer: Arc<dyn Observer<E>>) -> ObserverId {
        let registration = self.registration_for(observer);
        let id = registration.id;
        if self.global.load().iter().any(|r| r.id == id) {
            return id;
        }
        debug!(
            observer = %registration.observer.name(),
            priority = registration.observer.priority(),
            "Global observer registered"
        );
        self.global.rcu(|current| {
            let mut next = Vec::clone(current);
            if !next.iter().any(|r| r.id == id) {
                next.push(registration.clone());
            }
            next
        });
        id
    }

    /// Register an observer for one event type.
    pub fn add_scoped(&self, event_type: &str, observer: Arc<dyn Observer<E>>) -> ObserverId {
        let registration = self.registration_for(observer);
        let id = registration.id;
        let mut observers = self.scoped.entry(event_type.to_string()).or_default();
        if !observers.iter().any(|r| r.id == id) {
            debug!(
                observer = %registration.observer.name(),
                event_type = %event_type,
                "Scoped observer registered"
            );
            observers.push(registration);
        }
        id
    }

    // Reuse the id of an existing registration of the same observer instance.
    fn registration_for(&self, observer: Arc<dyn Observer<E>>) -> Registration<E> {
        let existing = self
            .global
            .load()
            .iter()
            .find(|r| same_observer(&r.observer, &observer))
            .map(|r| r.id)
            .or_else(|| {
                self.scoped.iter().find_map(|entry| {
                    entry
                        .iter()
                        .find(|r| same_observer(&r.observer, &observer))
                        .map(|r| r.id)
                })
            });
        match existing {
            Some(id) => Registration::with_id(id, observer),
            None => Registration::new(observer),
        }
    }

    /// Remove an observer from the global list and every scoped list.
    ///
    /// Returns `true` if it was registered anywhere. One call is enough for
    /// an observer registered in several lists.
    pub fn remove(&self, id: ObserverId) -> bool {
        let in_global = self.global.load().iter().any(|r| r.id == id);
        if in_global {
            self.global.rcu(|current| {
                current
                    .iter()
                    .filter(|r| r.id != id)
                    .cloned()
                    .collect::<Vec<_>>()
            });
        }

        let mut in_scoped = false;
        for mut entry in self.scoped.iter_mut() {
            let before = entry.len();
            entry.retain(|r| r.id != id);
            in_scoped |= entry.len() != before;
        }
        self.scoped.retain(|_, observers| !observers.is_empty());

        let removed = in_global || in_scoped;
        if removed {
            debug!(observer_id = %id, "Observer removed");
        }
        removed
    }

    /// Observers for `event_type`: global plus scoped, highest priority
    /// first. Ties keep registration order, global before scoped.
    pub(crate) fn snapshot(&self, event_type: Option<&str>) -> Vec<Registration<E>> {
        let mut observers: Vec<Registration<E>> = self.global.load().iter().cloned().collect();
        if let Some(scoped) = event_type.and_then(|t| self.scoped.get(t)) {
            observers.extend(scoped.iter().cloned());
        }
        observers.sort_by_key(|r| Reverse(r.observer.priority()));
        observers
    }

    pub fn global_count(&self) -> usize {
        self.global.load().len()
    }

    pub fn scoped_count(&self, event_type: &str) -> usize {
        self.scoped.get(event_type).map(|v| v.len()).unwrap_or_default()
    }

    /// Global registrations plus every scoped registration.
    pub fn len(&self) -> usize {
        self.global_count() + self.scoped.iter().map(|e| e.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Compare data pointers only; vtable pointers for one type may differ.
fn same_observer<E: Event>(a: &Arc<dyn Observer<E>>, b: &Arc<dyn Observer<E>>) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

impl<E: Event> fmt::Debug for ObserverRegistry<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("global", &self.global_count())
            .field("scoped_types", &self.scoped.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::event::BasicEvent;
    use crate::bus::observer::FnObserver;

    fn observer(name: &str, priority: i32) -> Arc<dyn Observer<BasicEvent>> {
        FnObserver::new(|_: &BasicEvent| Ok(()))
            .named(name)
            .with_priority(priority)
            .shared()
    }

    fn names(observers: &[Registration<BasicEvent>]) -> Vec<String> {
        observers
            .iter()
            .map(|r| r.observer.name().to_string())
            .collect()
    }

    #[test]
    fn snapshot_merges_and_sorts_by_priority() {
        let registry = ObserverRegistry::new();
        registry.add_global(observer("low", 1));
        registry.add_scoped("order.paid", observer("scoped-high", 9));
        registry.add_global(observer("mid", 5));
        registry.add_scoped("order.shipped", observer("other-type", 100));

        let snapshot = registry.snapshot(Some("order.paid"));

        assert_eq!(names(&snapshot), vec!["scoped-high", "mid", "low"]);
    }

    #[test]
    fn ties_keep_registration_order() {
        let registry = ObserverRegistry::new();
        registry.add_global(observer("first", 3));
        registry.add_global(observer("second", 3));
        registry.add_scoped("t", observer("third", 3));

        assert_eq!(
            names(&registry.snapshot(Some("t"))),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn one_observer_shares_one_id_across_lists() {
        let registry = ObserverRegistry::new();
        let shared = observer("everywhere", 0);
        let global_id = registry.add_global(Arc::clone(&shared));
        let scoped_id = registry.add_scoped("a", Arc::clone(&shared));
        let other_id = registry.add_scoped("b", Arc::clone(&shared));
        registry.add_scoped("a", observer("stays", 0));

        assert_eq!(global_id, scoped_id);
        assert_eq!(global_id, other_id);
        assert_eq!(registry.len(), 4);

        assert!(registry.remove(scoped_id));
        assert!(!registry.remove(global_id));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.global_count(), 0);
        assert_eq!(registry.scoped_count("a"), 1);
        assert_eq!(registry.scoped_count("b"), 0);
        assert_eq!(names(&registry.snapshot(Some("a"))), vec!["stays"]);
    }

    #[test]
    fn registering_twice_in_one_list_is_a_no_op() {
        let registry = ObserverRegistry::new();
        let shared = observer("once", 0);

        let first = registry.add_global(Arc::clone(&shared));
        let second = registry.add_global(Arc::clone(&shared));
        registry.add_scoped("t", Arc::clone(&shared));
        registry.add_scoped("t", shared);

        assert_eq!(first, second);
        assert_eq!(registry.global_count(), 1);
        assert_eq!(registry.scoped_count("t"), 1);
    }

    #[test]
    fn distinct_observers_get_distinct_ids() {
        let registry = ObserverRegistry::new();

        let a = registry.add_global(observer("a", 0));
        let b = registry.add_global(observer("b", 0));

        assert_ne!(a, b);
        assert_eq!(registry.global_count(), 2);
    }

    #[test]
    fn empty_scoped_lists_are_dropped() {
        let registry = ObserverRegistry::new();
        let id = registry.add_scoped("lonely", observer("only", 0));

        registry.remove(id);

        assert!(registry.is_empty());
        assert_eq!(registry.scoped.len(), 0);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_removal() {
        let registry = ObserverRegistry::new();
        let id = registry.add_global(observer("transient", 0));

        let snapshot = registry.snapshot(None);
        registry.remove(id);

        assert_eq!(snapshot.len(), 1);
        assert!(registry.snapshot(None).is_empty());
    }
}
