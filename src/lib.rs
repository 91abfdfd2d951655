//! Switchyard: event-driven state machines and a concurrent observer bus
//!
//! Switchyard keeps the description of a state graph apart from the code
//! that moves subjects through it. The graph is plain data: states and the
//! driven events that connect them. Persistence is delegated to a state
//! assistant and side effects to one behavior handler per event.
//!
//! # Core Concepts
//!
//! - **State**: Type-safe state representation via the `State` trait
//! - **DrivenEvent**: A named edge from a required state to a result state
//! - **StateMachine**: Reads the authoritative state, rejects stale
//!   transitions, persists the new state, then runs the event's handler
//! - **EventBus**: Prioritized, fault-isolated notification of sync and
//!   async observers
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard::builder::StateMachineBuilder;
//! use switchyard::core::{DrivenEvent, State};
//! use switchyard::machine::{FnHandler, InMemoryStateAssistant};
//! use switchyard::state_enum;
//!
//! state_enum! {
//!     enum Ticket {
//!         Open,
//!         InProgress,
//!         Closed,
//!     }
//!     final: [Closed]
//! }
//!
//! let start = DrivenEvent::new("start", Ticket::Open, Ticket::InProgress);
//! let close = DrivenEvent::new("close", Ticket::InProgress, Ticket::Closed);
//!
//! let store = Arc::new(InMemoryStateAssistant::new());
//! store.seed("T-42", Ticket::Open);
//!
//! let machine = StateMachineBuilder::<String, Ticket>::new()
//!     .assistant(store.clone())
//!     .handler(FnHandler::noop(start.clone()))
//!     .handler(FnHandler::noop(close.clone()))
//!     .build()
//!     .unwrap();
//!
//! assert!(machine.execute(&start, "T-42".to_string()).unwrap().is_applied());
//! assert!(machine.execute(&close, "T-42".to_string()).unwrap().is_applied());
//!
//! let history = store.history_of("T-42").unwrap();
//! assert_eq!(history.get_path(), vec![&Ticket::Open, &Ticket::InProgress, &Ticket::Closed]);
//! assert!(history.current().unwrap().is_final());
//! ```

pub mod builder;
pub mod bus;
pub mod config;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use bus::{AsyncEventBus, BasicEvent, Event, EventBus, FnObserver, Observable, Observer};
pub use config::{BusConfig, MachineConfig};
pub use core::{DrivenEvent, State, StateHistory, StateTransition};
pub use machine::{MachineError, StateAssistant, StateMachine, TransitionOutcome};
