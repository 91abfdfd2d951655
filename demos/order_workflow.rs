//! Order Workflow
//!
//! This example drives orders through a state graph whose state lives in a
//! store, and announces each step on an event bus.
//!
//! Key concepts:
//! - Driven events naming each edge (Created -> Paid -> Shipped)
//! - A state assistant as the single source of truth
//! - Stale transitions rejected instead of applied twice
//! - Behavior handlers publishing domain events
//!
//! Run with: cargo run --example order_workflow

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use switchyard::builder::StateMachineBuilder;
use switchyard::bus::{AsyncEventBus, BasicEvent, EventBus, FnObserver};
use switchyard::core::DrivenEvent;
use switchyard::machine::{FnHandler, InMemoryStateAssistant, Subject, TransitionOutcome};
use switchyard::state_enum;

state_enum! {
    enum OrderState {
        Created,
        Paid,
        Shipped,
        Cancelled,
    }
    final: [Shipped, Cancelled]
}

// Order entity
#[derive(Clone, Debug)]
struct Order {
    id: u64,
    total: f64,
}

impl Subject for Order {
    fn subject_id(&self) -> String {
        format!("order-{}", self.id)
    }
}

fn main() {
    println!("=== Order Workflow Example ===\n");

    // Notifications go out on a bus
    let bus = AsyncEventBus::with_defaults().unwrap();
    bus.register(
        "order.paid",
        FnObserver::new(|event: &BasicEvent| {
            println!("  [Billing] Receipt for {}", event.payload);
            Ok(())
        })
        .named("billing")
        .shared(),
    );
    bus.register(
        "order.shipped",
        FnObserver::new(|event: &BasicEvent| {
            println!("  [Warehouse] Dispatched {}", event.payload);
            Ok(())
        })
        .named("warehouse")
        .asynchronous()
        .shared(),
    );

    let pay = DrivenEvent::new("pay", OrderState::Created, OrderState::Paid);
    let ship = DrivenEvent::new("ship", OrderState::Paid, OrderState::Shipped);
    let cancel = DrivenEvent::new("cancel", OrderState::Created, OrderState::Cancelled);

    let store = Arc::new(InMemoryStateAssistant::new());
    store.seed("order-1", OrderState::Created);
    store.seed("order-2", OrderState::Created);

    let paid_bus = bus.clone();
    let shipped_bus = bus.clone();
    let machine = StateMachineBuilder::<Order, OrderState>::new()
        .assistant(store.clone())
        .handler(FnHandler::<Order, OrderState>::new(pay.clone(), move |ctx| {
            let order = ctx.subject();
            paid_bus.publish(
                BasicEvent::new("order.paid", "orders")
                    .with_payload(json!({ "order": order.id, "total": order.total })),
            );
            Ok(())
        }))
        .handler(FnHandler::<Order, OrderState>::new(ship.clone(), move |ctx| {
            shipped_bus.publish_async(
                BasicEvent::new("order.shipped", "orders")
                    .with_payload(json!({ "order": ctx.subject().id })),
            )?;
            Ok(())
        }))
        .handler(FnHandler::noop(cancel.clone()))
        .build()
        .unwrap();

    println!("Handlers registered for: {:?}\n", machine.events());

    let first = Order { id: 1, total: 149.99 };
    let second = Order { id: 2, total: 20.0 };

    let steps = [
        (&pay, first.clone()),
        (&ship, first.clone()),
        (&cancel, second.clone()),
        // Replays: the orders have already moved on
        (&pay, first),
        (&pay, second),
    ];

    for (event, order) in steps {
        println!("{} -> {}", order.subject_id(), event);
        match machine.execute(event, order) {
            Ok(TransitionOutcome::Applied(ctx)) => {
                println!("  Applied, now {}", ctx.final_state());
            }
            Ok(TransitionOutcome::Stale { actual, .. }) => {
                println!("  Rejected as stale: order is {}", actual);
            }
            Err(e) => println!("  Error: {}", e),
        }
    }

    bus.shutdown(Duration::from_secs(5));

    println!("\nHistory of order-1:");
    if let Some(history) = store.history_of("order-1") {
        for transition in history.transitions() {
            println!(
                "  {} : {} -> {}",
                transition.event, transition.from, transition.to
            );
        }
    }

    println!("\nKey Takeaways:");
    println!("- The store, not the caller, decides whether a transition applies");
    println!("- Each event has exactly one behavior handler");
    println!("- Handlers can fan out through the event bus");

    println!("\n=== Example Complete ===");
}
