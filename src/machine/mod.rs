//! Event-driven state machine.
//!
//! The imperative shell around [`crate::core`]: a [`StateMachine`] reads a
//! subject's authoritative state through a [`StateAssistant`], rejects
//! stale transitions, persists the new state, and then runs the single
//! [`BehaviorHandler`] registered for the event.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard::builder::StateMachineBuilder;
//! use switchyard::core::DrivenEvent;
//! use switchyard::machine::{FnHandler, InMemoryStateAssistant};
//! use switchyard::state_enum;
//!
//! state_enum! {
//!     enum Invoice {
//!         Draft,
//!         Sent,
//!         Paid,
//!     }
//!     final: [Paid]
//! }
//!
//! let send = DrivenEvent::new("send", Invoice::Draft, Invoice::Sent);
//! let store = Arc::new(InMemoryStateAssistant::new());
//! store.seed("inv-1", Invoice::Draft);
//!
//! let machine = StateMachineBuilder::<String, Invoice>::new()
//!     .assistant(store.clone())
//!     .handler(FnHandler::noop(send.clone()))
//!     .build()
//!     .unwrap();
//!
//! let first = machine.execute(&send, "inv-1".to_string()).unwrap();
//! assert!(first.is_applied());
//! assert_eq!(store.state_of("inv-1"), Some(Invoice::Sent));
//!
//! // Replaying the same transition is stale: the invoice is no longer a draft.
//! let replay = machine.execute(&send, "inv-1".to_string()).unwrap();
//! assert!(replay.is_stale());
//! ```

mod assistant;
mod context;
mod error;
mod handler;
mod state_machine;

pub use assistant::{AssistantError, InMemoryStateAssistant, StateAssistant};
pub use context::{StateContext, Subject};
pub use error::MachineError;
pub use handler::{BehaviorHandler, FnHandler, HandlerAction, HandlerError, HandlerRegistry};
pub use state_machine::{StateMachine, TransitionOutcome};
