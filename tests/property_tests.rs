//! Property-based tests for state machine and bus invariants.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use chrono::Utc;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use switchyard::builder::StateMachineBuilder;
use switchyard::bus::{AsyncEventBus, BasicEvent, EventBus, FnObserver, Observable};
use switchyard::core::{DrivenEvent, State, StateHistory, StateTransition};
use switchyard::machine::{FnHandler, InMemoryStateAssistant};
use switchyard::state_enum;
use uuid::Uuid;

state_enum! {
    enum TestState {
        Initial,
        Processing,
        Complete,
        Failed,
    }
    final: [Complete, Failed]
    error: [Failed]
}

const ALL_STATES: [TestState; 4] = [
    TestState::Initial,
    TestState::Processing,
    TestState::Complete,
    TestState::Failed,
];

prop_compose! {
    fn arbitrary_state()(variant in 0..4usize) -> TestState {
        ALL_STATES[variant].clone()
    }
}

fn transition(from: TestState, to: TestState, event: &str) -> StateTransition<TestState> {
    StateTransition {
        from,
        to,
        event: event.to_string(),
        context_id: Uuid::new_v4(),
        timestamp: Utc::now(),
    }
}

proptest! {
    #[test]
    fn state_name_is_stable(state in arbitrary_state()) {
        prop_assert_eq!(state.name(), state.name());
        prop_assert_eq!(TestState::from_name(state.name()), Some(state.clone()));
    }

    #[test]
    fn error_states_are_final(state in arbitrary_state()) {
        if state.is_error() {
            prop_assert!(state.is_final());
        }
    }

    #[test]
    fn same_as_matches_equality(a in arbitrary_state(), b in arbitrary_state()) {
        prop_assert_eq!(a.same_as(&b), a == b);
    }

    #[test]
    fn event_applies_only_to_its_required_state(
        required in arbitrary_state(),
        result in arbitrary_state(),
        current in arbitrary_state(),
    ) {
        let event = DrivenEvent::new("move", required.clone(), result);
        prop_assert_eq!(event.applies_to(&current), current == required);
    }

    #[test]
    fn history_preserves_order(
        states in prop::collection::vec(arbitrary_state(), 1..10)
    ) {
        let mut history = StateHistory::new();
        let mut expected_path = vec![TestState::Initial];

        for (i, to_state) in states.iter().enumerate() {
            let from_state = if i == 0 {
                TestState::Initial
            } else {
                states[i - 1].clone()
            };

            history = history.record(transition(from_state, to_state.clone(), "step"));
            expected_path.push(to_state.clone());
        }

        let path = history.get_path();
        prop_assert_eq!(path.len(), expected_path.len());

        for (i, state) in path.iter().enumerate() {
            prop_assert_eq!(*state, &expected_path[i]);
        }
        prop_assert_eq!(history.current(), expected_path.last());
    }

    #[test]
    fn history_record_is_pure(state1 in arbitrary_state(), state2 in arbitrary_state()) {
        let history = StateHistory::new();

        let new_history = history.record(transition(state1, state2, "step"));

        // Original history unchanged
        prop_assert_eq!(history.transitions().len(), 0);
        prop_assert_eq!(new_history.transitions().len(), 1);
    }

    #[test]
    fn history_roundtrip_serialization(
        states in prop::collection::vec(arbitrary_state(), 0..5)
    ) {
        let mut history = StateHistory::new();
        let mut from = TestState::Initial;

        for to_state in &states {
            history = history.record(transition(from, to_state.clone(), "step"));
            from = to_state.clone();
        }

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<TestState> = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(history.get_path(), deserialized.get_path());
        prop_assert_eq!(history.events(), deserialized.events());
    }

    #[test]
    fn execute_applies_exactly_when_state_matches(
        seeded in arbitrary_state(),
        required in arbitrary_state(),
        result in arbitrary_state(),
    ) {
        let event = DrivenEvent::new("move", required.clone(), result.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let store = Arc::new(InMemoryStateAssistant::new());
        store.seed("subject", seeded.clone());

        let machine = StateMachineBuilder::<String, TestState>::new()
            .assistant(store.clone())
            .handler(FnHandler::new(event.clone(), move |_ctx| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .build()
            .unwrap();

        let outcome = machine.execute(&event, "subject".to_string()).unwrap();

        if seeded == required {
            prop_assert!(outcome.is_applied());
            prop_assert_eq!(store.state_of("subject"), Some(result));
            prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
            prop_assert_eq!(store.write_count(), 1);
        } else {
            prop_assert!(outcome.is_stale());
            prop_assert_eq!(store.state_of("subject"), Some(seeded));
            prop_assert_eq!(calls.load(Ordering::SeqCst), 0);
            prop_assert_eq!(store.write_count(), 0);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sync_observers_run_in_non_increasing_priority(
        priorities in prop::collection::vec(-50i32..50, 1..12)
    ) {
        let bus = AsyncEventBus::with_defaults().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for (i, priority) in priorities.iter().enumerate() {
            let seen = Arc::clone(&seen);
            let priority = *priority;
            let observer = FnObserver::new(move |_: &BasicEvent| {
                seen.lock().unwrap().push(priority);
                Ok(())
            })
            .with_priority(priority)
            .shared();

            if i % 2 == 0 {
                bus.add_observer(observer);
            } else {
                bus.register("sample", observer);
            }
        }

        let report = bus.publish(BasicEvent::new("sample", "proptest"));

        let order = seen.lock().unwrap().clone();
        prop_assert_eq!(report.sync_delivered, priorities.len());
        prop_assert_eq!(order.len(), priorities.len());
        prop_assert!(order.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn register_then_unregister_restores_count(
        existing in 0usize..6,
        event_type in "[a-z]{1,8}",
    ) {
        let bus: AsyncEventBus<BasicEvent> = AsyncEventBus::with_defaults().unwrap();
        for _ in 0..existing {
            bus.add_observer(FnObserver::new(|_: &BasicEvent| Ok(())).shared());
        }
        let before = bus.observer_count();

        let id = bus.register(&event_type, FnObserver::new(|_: &BasicEvent| Ok(())).shared());
        prop_assert_eq!(bus.observer_count(), before + 1);

        prop_assert!(bus.unregister(id));
        prop_assert_eq!(bus.observer_count(), before);
    }
}
