//! Event Bus
//!
//! This example fans events out to prioritized observers, some of them
//! running on the bus's worker pool.
//!
//! Key concepts:
//! - Global and type-scoped observers
//! - Synchronous observers notified in priority order
//! - Asynchronous observers on a bounded pool
//! - Failing observers isolated from the publisher and each other
//! - Removal and bounded shutdown
//!
//! Run with: cargo run --example event_bus

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use switchyard::bus::{AsyncEventBus, BasicEvent, EventBus, FnObserver, Observable};
use switchyard::config::{BusConfig, OverflowPolicy};

fn main() {
    println!("=== Event Bus Example ===\n");

    let config = BusConfig::default()
        .worker_threads(2)
        .max_pending(64)
        .overflow(OverflowPolicy::CallerRuns);
    let bus = AsyncEventBus::new(config).unwrap();

    // Runs first for every event
    bus.add_observer(
        FnObserver::new(|event: &BasicEvent| {
            println!("  [Audit] {} from {}", event.event_type, event.source);
            Ok(())
        })
        .named("audit")
        .with_priority(100)
        .shared(),
    );

    // Rejects malformed sign-ups without affecting anyone else
    bus.register(
        "user.created",
        FnObserver::new(|event: &BasicEvent| {
            if event.payload["email"].is_null() {
                return Err("missing email".into());
            }
            println!("  [Validator] {} looks fine", event.payload["email"]);
            Ok(())
        })
        .named("validator")
        .with_priority(50)
        .shared(),
    );

    // Slow work off the publishing thread
    let welcomes = Arc::new(AtomicUsize::new(0));
    let sent = Arc::clone(&welcomes);
    let mailer = bus.register(
        "user.created",
        FnObserver::new(move |event: &BasicEvent| {
            std::thread::sleep(Duration::from_millis(20));
            sent.fetch_add(1, Ordering::SeqCst);
            println!("  [Mailer] Welcome sent to {}", event.payload["email"]);
            Ok(())
        })
        .named("mailer")
        .asynchronous()
        .shared(),
    );

    println!("Observers registered: {}\n", bus.observer_count());

    println!("Publishing a valid sign-up:");
    let report = bus.publish(
        BasicEvent::new("user.created", "signup").with_payload(json!({ "email": "ada@example.com" })),
    );
    println!("  Report: {:?}\n", report);

    println!("Publishing a malformed sign-up:");
    let report = bus.publish(BasicEvent::new("user.created", "signup"));
    println!("  Report: {:?}\n", report);

    println!("Publishing in the background:");
    bus.publish_async(
        BasicEvent::new("user.created", "import").with_payload(json!({ "email": "grace@example.com" })),
    )
    .unwrap();

    bus.unregister(mailer);
    println!("\nMailer removed, observers left: {}", bus.observer_count());

    let shutdown = bus.shutdown(Duration::from_secs(5));
    println!(
        "Shutdown drained: {} (welcome mails sent: {})",
        shutdown.drained,
        welcomes.load(Ordering::SeqCst)
    );

    println!("\nKey Takeaways:");
    println!("- Priority decides the order of synchronous observers");
    println!("- Errors and panics in observers are logged, never propagated");
    println!("- Shutdown waits for accepted background work");

    println!("\n=== Example Complete ===");
}
