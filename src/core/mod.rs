//! Core state graph types.
//!
//! This module contains the plain data of the state machine:
//! - State definitions via the `State` trait
//! - Driven events naming each edge of the graph
//! - Immutable transition history
//!
//! Nothing in here performs I/O; persistence and side effects live in
//! [`crate::machine`].

mod event;
mod history;
mod state;

pub use event::DrivenEvent;
pub use history::{StateHistory, StateTransition};
pub use state::State;
